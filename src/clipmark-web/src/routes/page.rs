//! Annotation page
//!
//! The HTML shell is embedded at compile time; the current video and its
//! saved annotation are filled in per request.

use crate::{ApiError, AppState};
use axum::{extract::State, response::Html};
use clipmark_store::video_name;
use serde_json::Value;
use tracing::debug;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// What the page shows for one request
#[derive(Debug, Default, PartialEq)]
pub struct PageContext {
    pub video_file: Option<String>,
    pub video_name: Option<String>,
    pub saved_data: Option<Value>,
}

/// GET / - Render the page for the current video
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let context = page_context(&state)?;
    Ok(Html(render_index(&context)))
}

/// Resolve the current video and its saved annotation
pub fn page_context(state: &AppState) -> Result<PageContext, ApiError> {
    let videos = state.library.list_videos()?;

    let video_file = {
        let mut navigator = state
            .navigator
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("navigator lock poisoned")))?;
        navigator.current(&videos).map(str::to_string)
    };

    let Some(video_file) = video_file else {
        debug!("no videos in {:?}", state.library.dir());
        return Ok(PageContext::default());
    };

    let name = video_name(&video_file).to_string();
    let saved_data = state.annotations.get(&name);

    Ok(PageContext {
        video_file: Some(video_file),
        video_name: Some(name),
        saved_data,
    })
}

/// Fill the embedded template
pub fn render_index(context: &PageContext) -> String {
    let player = match &context.video_file {
        Some(file) => format!(
            r#"<video id="mainVideo" src="/video/{}" preload="metadata"></video>"#,
            escape_html(&encode_path_segment(file))
        ),
        None => r#"<div id="emptyState" class="empty-state">No videos found. Add .mp4 or .mov files to the video folder and reload.</div>"#
            .to_string(),
    };

    let title = context.video_name.as_deref().unwrap_or("No video");

    INDEX_HTML
        .replace("{{title}}", &escape_html(title))
        .replace("{{player}}", &player)
        .replace("{{video_name_json}}", &script_json(&context.video_name))
        .replace("{{saved_data_json}}", &script_json(&context.saved_data))
}

/// Escape text for HTML content and attribute values
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a file name for use as one URL path segment
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Serialize a value for embedding inside a `<script>` element
fn script_json<T: serde::Serialize>(value: &T) -> String {
    // `<` only occurs inside JSON strings, where `\u003c` is equivalent
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}
