//! Shared application state

use clipmark_store::{AnnotationStore, Navigator, VideoLibrary};
use std::sync::{Arc, Mutex};

/// Shared state across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Source video directory
    pub library: Arc<VideoLibrary>,

    /// Which video the page shows (locked per request)
    pub navigator: Arc<Mutex<Navigator>>,

    /// Saved annotations
    pub annotations: Arc<AnnotationStore>,
}

impl AppState {
    /// Create new application state with the cursor on the first video
    pub fn new(library: VideoLibrary, annotations: AnnotationStore) -> Self {
        Self {
            library: Arc::new(library),
            navigator: Arc::new(Mutex::new(Navigator::new())),
            annotations: Arc::new(annotations),
        }
    }
}
