//! HTTP error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clipmark_store::StoreError;
use serde_json::json;

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("range not satisfiable")]
    RangeNotSatisfiable { file_size: u64 },

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_name, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg),
            ApiError::RangeNotSatisfiable { file_size } => {
                let body = Json(json!({
                    "error": "RangeNotSatisfiable",
                    "message": "requested range not satisfiable",
                }));
                let content_range = format!("bytes */{}", file_size);
                return (
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(axum::http::header::CONTENT_RANGE, content_range)],
                    body,
                )
                    .into_response();
            }
            ApiError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                err.to_string(),
            ),
            ApiError::Store(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "StoreError",
                msg,
            ),
            ApiError::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IoError",
                err.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", message);
        }

        let body = Json(json!({
            "error": error_name,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => ApiError::Io(e),
            other => ApiError::Store(other.to_string()),
        }
    }
}

/// Malformed or non-JSON request bodies are the client's fault
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
