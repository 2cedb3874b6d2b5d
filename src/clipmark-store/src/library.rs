//! Video directory listing
//!
//! The listing is recomputed on every call so files dropped into the
//! directory while the server runs show up on the next page load.

use crate::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Extensions (lowercase, without the dot) that count as playable videos
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// Check whether a file name carries one of the video extensions (case-insensitive)
pub fn is_video_file(file_name: impl AsRef<Path>) -> bool {
    file_name
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Base name used as the annotation key: the file name minus its final extension
pub fn video_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Content type sent with a streamed file
pub fn content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// A single file name with no separators and no `.`/`..` component
///
/// Backslashes are refused on every platform. Shared by `list_videos` and
/// `resolve`.
fn is_plain_name(file_name: &str) -> bool {
    if file_name.is_empty() || file_name.contains('\\') {
        return false;
    }

    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// A directory of source videos
#[derive(Debug, Clone)]
pub struct VideoLibrary {
    dir: PathBuf,
}

impl VideoLibrary {
    /// Open the library, creating the directory if it does not exist yet
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            info!("creating video directory {:?}", dir);
        }
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory being listed
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List video file names in the directory, sorted ascending
    ///
    /// Non-recursive. Entries that are not regular files, whose names are
    /// not valid UTF-8, or that `resolve` would refuse are skipped.
    pub fn list_videos(&self) -> Result<Vec<String>> {
        let mut videos = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;

            let Ok(name) = entry.file_name().into_string() else {
                debug!("skipping non utf-8 entry in {:?}", self.dir);
                continue;
            };

            if !is_video_file(&name) || !is_plain_name(&name) {
                continue;
            }

            // Follows symlinks, so a linked video still counts
            if !entry.path().is_file() {
                continue;
            }

            videos.push(name);
        }

        videos.sort();
        Ok(videos)
    }

    /// Resolve a requested file name to a path inside the directory
    ///
    /// Only a single plain file name is accepted. Returns `None` for anything
    /// containing separators or `.`/`..` components, for missing files, and
    /// for files whose canonical location is outside the directory.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if !is_plain_name(file_name) {
            return None;
        }

        let candidate = self.dir.join(file_name);
        let canonical = candidate.canonicalize().ok()?;
        let root = self.dir.canonicalize().ok()?;

        if !canonical.starts_with(&root) || !canonical.is_file() {
            debug!("rejecting {:?}: outside video directory or not a file", file_name);
            return None;
        }

        Some(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"data").unwrap();
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("clip.mp4"));
        assert!(is_video_file("CLIP.MOV"));
        assert!(is_video_file("take.Mp4"));
        assert!(!is_video_file("notes.txt"));
        assert!(!is_video_file("mp4"));
        assert!(!is_video_file(".mp4"));
        assert!(!is_video_file("clip.mkv"));
    }

    #[test]
    fn test_video_name_strips_last_extension() {
        assert_eq!(video_name("clip1.mp4"), "clip1");
        assert_eq!(video_name("clip.v2.MOV"), "clip.v2");
        assert_eq!(video_name("plain"), "plain");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.mp4"), "video/mp4");
        assert_eq!(content_type("a.MOV"), "video/quicktime");
        assert_eq!(content_type("a.txt"), "application/octet-stream");
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempdir().unwrap();
        let videos = dir.path().join("nested").join("data");

        let library = VideoLibrary::open(&videos).unwrap();

        assert!(videos.is_dir());
        assert!(library.list_videos().unwrap().is_empty());
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.mov", "a.MP4", "c.mp4", "readme.txt", "thumb.jpg"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("folder.mp4")).unwrap();

        let library = VideoLibrary::open(dir.path()).unwrap();
        let videos = library.list_videos().unwrap();

        assert_eq!(videos, vec!["a.MP4", "b.mov", "c.mp4"]);
    }

    #[test]
    fn test_list_is_not_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "hidden.mp4");
        touch(dir.path(), "top.mp4");

        let library = VideoLibrary::open(dir.path()).unwrap();
        assert_eq!(library.list_videos().unwrap(), vec!["top.mp4"]);
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "clip.mp4");
        let library = VideoLibrary::open(dir.path()).unwrap();

        let resolved = library.resolve("clip.mp4").unwrap();
        assert!(resolved.ends_with("clip.mp4"));
        assert!(library.resolve("missing.mp4").is_none());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempdir().unwrap();
        let videos = dir.path().join("data");
        fs::create_dir(&videos).unwrap();
        touch(dir.path(), "secret.mp4");
        let library = VideoLibrary::open(&videos).unwrap();

        assert!(library.resolve("../secret.mp4").is_none());
        assert!(library.resolve("../../etc/passwd").is_none());
        assert!(library.resolve("/etc/passwd").is_none());
        assert!(library.resolve("..").is_none());
        assert!(library.resolve(".").is_none());
        assert!(library.resolve("").is_none());
        assert!(library.resolve("..\\secret.mp4").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_list_matches_resolve_for_backslash_names() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a\\b.mp4");
        touch(dir.path(), "c.mp4");
        let library = VideoLibrary::open(dir.path()).unwrap();

        let videos = library.list_videos().unwrap();
        assert_eq!(videos, vec!["c.mp4"]);
        for name in &videos {
            assert!(library.resolve(name).is_some(), "{} is not streamable", name);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let dir = tempdir().unwrap();
        let videos = dir.path().join("data");
        fs::create_dir(&videos).unwrap();
        touch(dir.path(), "outside.mp4");
        std::os::unix::fs::symlink(dir.path().join("outside.mp4"), videos.join("link.mp4"))
            .unwrap();
        let library = VideoLibrary::open(&videos).unwrap();

        assert!(library.resolve("link.mp4").is_none());
    }
}
