//! Video streaming with HTTP Range requests

use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use clipmark_store::content_type;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

/// Maximum chunk size for range requests (10 MB)
const MAX_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Parse Range header
///
/// Supports a single `bytes=start-end`, `bytes=start-` or `bytes=-suffix`
/// range. The returned end is inclusive and clamped to the file.
fn parse_range_header(range: &str, file_size: u64) -> Option<(u64, u64)> {
    let range = range.trim().strip_prefix("bytes=")?;
    if file_size == 0 || range.contains(',') {
        return None;
    }

    let (start, end) = range.split_once('-')?;
    let (start, end) = match (start.trim(), end.trim()) {
        ("", "") => return None,
        ("", suffix) => {
            let suffix: u64 = suffix.parse().ok()?;
            if suffix == 0 {
                return None;
            }
            (file_size.saturating_sub(suffix), file_size - 1)
        }
        (start, "") => (start.parse::<u64>().ok()?, file_size - 1),
        (start, end) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            (start, end.min(file_size - 1))
        }
    };

    if start <= end && start < file_size {
        Some((start, end))
    } else {
        None
    }
}

/// GET /video/*filename - Stream a video from the video directory
pub async fn stream_video(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    // A name that does not decode to UTF-8 cannot match any listed video
    let Path(filename) = filename.map_err(|e| {
        debug!("undecodable video path: {}", e);
        ApiError::NotFound("video file not found".to_string())
    })?;

    // Rejects separators, `..` and anything resolving outside the directory
    let file_path = state
        .library
        .resolve(&filename)
        .ok_or_else(|| ApiError::NotFound(format!("video file not found: {}", filename)))?;

    let mime = content_type(&filename);

    // Get file metadata
    let metadata = tokio::fs::metadata(&file_path).await?;
    let file_size = metadata.len();

    // Check for Range header
    if let Some(range_header) = headers.get(header::RANGE) {
        let range_str = range_header.to_str().unwrap_or("");

        let Some((start, end)) = parse_range_header(range_str, file_size) else {
            return Err(ApiError::RangeNotSatisfiable { file_size });
        };

        // Serve at most MAX_CHUNK_SIZE; the browser asks again for the rest
        let end = end.min(start + MAX_CHUNK_SIZE - 1);
        let chunk_size = end - start + 1;
        debug!("range {}-{} of {} for {}", start, end, file_size, filename);

        // Use spawn_blocking for sync file I/O to avoid blocking tokio runtime
        let buffer = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
            let mut file = File::open(&file_path)?;
            file.seek(SeekFrom::Start(start))?;

            let mut buffer = vec![0u8; chunk_size as usize];
            file.read_exact(&mut buffer)?;
            Ok(buffer)
        })
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("task join error: {}", e)))??;

        let content_range = format!("bytes {}-{}/{}", start, end, file_size);

        return Ok((
            StatusCode::PARTIAL_CONTENT,
            [
                (header::CONTENT_TYPE, mime.to_string()),
                (header::CONTENT_LENGTH, chunk_size.to_string()),
                (header::CONTENT_RANGE, content_range),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            buffer,
        )
            .into_response());
    }

    // No range header - serve entire file
    let file = tokio::fs::File::open(&file_path).await?;
    let stream = tokio_util::io::ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, file_size.to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
        ],
        body,
    )
        .into_response())
}
