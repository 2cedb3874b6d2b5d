//! clipmark-store - Filesystem state for Clipmark
//!
//! Lists the videos in a watched directory, tracks which one is being
//! annotated, and persists annotations to a single JSON document.

mod annotations;
mod error;
mod library;
mod navigation;

pub use annotations::{
    merge_document, AnnotationStore, Document, LoadedDocument, DEFAULT_RESULTS_FILE,
};
pub use error::{Result, StoreError};
pub use library::{content_type, is_video_file, video_name, VideoLibrary, VIDEO_EXTENSIONS};
pub use navigation::{Direction, Navigator};
