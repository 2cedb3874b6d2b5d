//! Current-video cursor

use crate::{Result, StoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction requested by the prev/next buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    /// Parse the wire value; anything other than `next`/`prev` is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "next" => Some(Direction::Next),
            "prev" => Some(Direction::Prev),
            _ => None,
        }
    }
}

/// Index of the video currently shown
///
/// Not persisted; every process starts at the first video.
#[derive(Debug, Default, Clone)]
pub struct Navigator {
    cursor: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw cursor value (may be stale if the listing shrank)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pick the current video out of `videos`
    ///
    /// A cursor that no longer fits the listing is reset to the first video.
    pub fn current<'a>(&mut self, videos: &'a [String]) -> Option<&'a str> {
        if videos.is_empty() {
            return None;
        }

        if self.cursor >= videos.len() {
            debug!("cursor {} out of range for {} videos, resetting", self.cursor, videos.len());
            self.cursor = 0;
        }

        Some(videos[self.cursor].as_str())
    }

    /// Move the cursor over a listing of `count` videos
    ///
    /// `next` wraps from the last video back to the first. `prev` stops at
    /// the first video instead of wrapping. `None` leaves the cursor alone.
    /// Fails without touching the cursor when there are no videos.
    pub fn advance(&mut self, direction: Option<Direction>, count: usize) -> Result<usize> {
        if count == 0 {
            return Err(StoreError::NoVideos);
        }

        match direction {
            Some(Direction::Next) => {
                self.cursor = if self.cursor + 1 >= count { 0 } else { self.cursor + 1 };
            }
            Some(Direction::Prev) => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            None => {}
        }

        Ok(self.cursor)
    }
}
