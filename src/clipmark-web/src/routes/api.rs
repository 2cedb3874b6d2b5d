//! JSON API handlers

use crate::{ApiError, AppState};
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use clipmark_store::{Direction, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Body of POST /switch_video
///
/// `direction` is kept as raw JSON so that non-string values fall through
/// to the no-op case instead of failing the extractor.
#[derive(Debug, Deserialize)]
pub struct SwitchVideoRequest {
    #[serde(default)]
    pub direction: Option<Value>,
}

/// Response for POST /switch_video
#[derive(Debug, Serialize, PartialEq)]
pub struct SwitchVideoResponse {
    pub success: bool,
}

/// Response for POST /save
#[derive(Debug, Serialize, PartialEq)]
pub struct SaveResponse {
    pub status: String,
    pub message: String,
}

/// POST /switch_video
///
/// `success` is false only when there are no videos. Unknown directions
/// leave the cursor where it is.
pub async fn switch_video(
    State(state): State<AppState>,
    payload: Result<Json<SwitchVideoRequest>, JsonRejection>,
) -> Result<Json<SwitchVideoResponse>, ApiError> {
    let Json(request) = payload?;
    let videos = state.library.list_videos()?;

    let direction = request
        .direction
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Direction::parse);
    if direction.is_none() {
        debug!("ignoring switch direction {:?}", request.direction);
    }

    let mut navigator = state
        .navigator
        .lock()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("navigator lock poisoned")))?;

    match navigator.advance(direction, videos.len()) {
        Ok(cursor) => {
            debug!("cursor now {} of {}", cursor, videos.len());
            Ok(Json(SwitchVideoResponse { success: true }))
        }
        Err(StoreError::NoVideos) => Ok(Json(SwitchVideoResponse { success: false })),
        Err(e) => Err(e.into()),
    }
}

/// POST /save
///
/// Merges the body (a JSON object keyed by video name) into the stored
/// annotations. The payload shape below the top level is not checked.
pub async fn save_annotations(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(body) = payload?;

    let Value::Object(update) = body else {
        return Err(ApiError::BadRequest(
            "expected a JSON object keyed by video name".to_string(),
        ));
    };

    let keys = update.len();
    state.annotations.save(update)?;
    info!("saved annotations ({} key(s)) to {:?}", keys, state.annotations.path());

    Ok(Json(SaveResponse {
        status: "success".to_string(),
        message: "results saved to json file successfully".to_string(),
    }))
}
