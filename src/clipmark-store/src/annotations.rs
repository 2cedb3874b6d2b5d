//! Annotation document
//!
//! Storage: a single JSON object at `{results_dir}/{results_file}` mapping a
//! video's base name to whatever the page saved for it.

use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Default file name for the annotation document
pub const DEFAULT_RESULTS_FILE: &str = "results.json";

/// Top-level annotation document: video name -> saved payload
pub type Document = Map<String, Value>;

/// Outcome of reading the annotation document from disk
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedDocument {
    /// File parsed as a JSON object
    Found(Document),
    /// No file yet
    Missing,
    /// File exists but could not be read
    Unreadable(String),
    /// File is not valid JSON, or its top level is not an object
    Invalid(String),
}

impl LoadedDocument {
    /// Collapse to a document. Every failure becomes an empty document.
    pub fn into_document(self) -> Document {
        match self {
            LoadedDocument::Found(doc) => doc,
            LoadedDocument::Missing
            | LoadedDocument::Unreadable(_)
            | LoadedDocument::Invalid(_) => Document::new(),
        }
    }
}

/// Merge `update` into `doc`
///
/// Keys not mentioned in `update` are kept. When both the stored and the new
/// value for a key are objects, the new object's fields replace the stored
/// fields of the same name and the rest are kept; nothing below that level
/// is merged. Any other new value replaces the stored one.
pub fn merge_document(doc: &mut Document, update: Document) {
    for (key, value) in update {
        match (doc.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(fields)) => {
                for (field, field_value) in fields {
                    existing.insert(field, field_value);
                }
            }
            (_, value) => {
                doc.insert(key, value);
            }
        }
    }
}

/// Reads and writes the annotation document
#[derive(Debug)]
pub struct AnnotationStore {
    path: PathBuf,
    /// Serializes load-merge-write in `save`
    write_lock: Mutex<()>,
}

impl AnnotationStore {
    /// Open the store in `results_dir` with the default file name
    pub fn open(results_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_file(results_dir, DEFAULT_RESULTS_FILE)
    }

    /// Open the store at `results_dir/file_name`, creating the directory
    pub fn open_file(results_dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        let results_dir = results_dir.as_ref();
        if !results_dir.exists() {
            info!("creating results directory {:?}", results_dir);
        }
        fs::create_dir_all(results_dir)?;

        Ok(Self {
            path: results_dir.join(file_name),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, reporting what was found
    pub fn load(&self) -> LoadedDocument {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadedDocument::Missing,
            Err(e) => {
                warn!("failed to read annotations {:?}: {}", self.path, e);
                return LoadedDocument::Unreadable(e.to_string());
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(doc)) => LoadedDocument::Found(doc),
            Ok(other) => {
                let reason = format!("expected a JSON object, found {}", json_kind(&other));
                warn!("ignoring annotations {:?}: {}", self.path, reason);
                LoadedDocument::Invalid(reason)
            }
            Err(e) => {
                warn!("ignoring annotations {:?}: {}", self.path, e);
                LoadedDocument::Invalid(e.to_string())
            }
        }
    }

    /// Saved payload for one video, if any
    pub fn get(&self, video_name: &str) -> Option<Value> {
        self.load().into_document().remove(video_name)
    }

    /// Merge `update` into the stored document and write it back
    ///
    /// Returns the document as written.
    pub fn save(&self, update: Document) -> Result<Document> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut doc = self.load().into_document();
        let keys: Vec<&String> = update.keys().collect();
        debug!("saving annotations for {:?}", keys);

        merge_document(&mut doc, update);
        self.write(&doc)?;

        Ok(doc)
    }

    /// Write via temp file + rename so readers never see a partial file
    fn write(&self, doc: &Document) -> Result<()> {
        let mut content = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
        doc.serialize(&mut serializer)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_RESULTS_FILE);
        let temp_path = self
            .path
            .with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()));

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(&content)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("results");

        let store = AnnotationStore::open(&results).unwrap();

        assert!(results.is_dir());
        assert_eq!(store.path(), results.join("results.json"));
    }

    #[test]
    fn test_load_missing() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        assert_eq!(store.load(), LoadedDocument::Missing);
        assert!(store.load().into_document().is_empty());
        assert_eq!(store.get("clip1"), None);
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        let loaded = store.load();
        assert!(matches!(loaded, LoadedDocument::Invalid(_)));
        assert!(loaded.into_document().is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();
        fs::write(store.path(), "").unwrap();

        assert!(matches!(store.load(), LoadedDocument::Invalid(_)));
    }

    #[test]
    fn test_load_non_object_is_invalid() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        match store.load() {
            LoadedDocument::Invalid(reason) => assert!(reason.contains("an array")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_load_directory_is_unreadable() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open_file(dir.path(), "results.json").unwrap();
        fs::create_dir(store.path()).unwrap();

        assert!(matches!(store.load(), LoadedDocument::Unreadable(_)));
    }

    #[test]
    fn test_get_existing() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();
        fs::write(store.path(), r#"{"clip1": {"actions": ["cut"]}}"#).unwrap();

        assert_eq!(store.get("clip1"), Some(json!({"actions": ["cut"]})));
        assert_eq!(store.get("clip2"), None);
    }

    #[test]
    fn test_save_creates_file() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        store.save(doc(json!({"clip1": {"a": 1}}))).unwrap();

        assert!(matches!(store.load(), LoadedDocument::Found(_)));
        assert_eq!(store.get("clip1"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_save_merges_entry_fields() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();
        fs::write(store.path(), "{}").unwrap();

        store.save(doc(json!({"clip1": {"a": 1}}))).unwrap();
        store.save(doc(json!({"clip1": {"b": 2}}))).unwrap();

        let stored: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(stored, json!({"clip1": {"a": 1, "b": 2}}));
    }

    #[test]
    fn test_save_preserves_other_videos() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        store.save(doc(json!({"clip1": {"a": 1}}))).unwrap();
        let merged = store.save(doc(json!({"clip2": [1, 2]}))).unwrap();

        assert_eq!(Value::Object(merged), json!({"clip1": {"a": 1}, "clip2": [1, 2]}));
    }

    #[test]
    fn test_save_does_not_merge_nested_objects() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        store.save(doc(json!({"clip1": {"meta": {"x": 1}, "keep": true}}))).unwrap();
        store.save(doc(json!({"clip1": {"meta": {"y": 2}}}))).unwrap();

        assert_eq!(
            store.get("clip1"),
            Some(json!({"meta": {"y": 2}, "keep": true}))
        );
    }

    #[test]
    fn test_save_replaces_non_object_entries() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        store.save(doc(json!({"clip1": "draft"}))).unwrap();
        store.save(doc(json!({"clip1": {"a": 1}}))).unwrap();
        assert_eq!(store.get("clip1"), Some(json!({"a": 1})));

        store.save(doc(json!({"clip1": null}))).unwrap();
        assert_eq!(store.get("clip1"), Some(Value::Null));
    }

    #[test]
    fn test_save_over_corrupt_file() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();
        fs::write(store.path(), "garbage").unwrap();

        store.save(doc(json!({"clip1": 1}))).unwrap();

        assert_eq!(
            store.load(),
            LoadedDocument::Found(doc(json!({"clip1": 1})))
        );
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        store.save(doc(json!({"clip1": {"a": 1}}))).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\n    \"clip1\": {\n        \"a\": 1"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::open(dir.path()).unwrap();

        store.save(doc(json!({"clip1": 1}))).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["results.json"]);
    }

    #[test]
    fn test_concurrent_saves_keep_every_key() {
        let dir = tempdir().unwrap();
        let store = Arc::new(AnnotationStore::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut update = Document::new();
                    update.insert(format!("clip{}", i), json!(i));
                    store.save(update).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load().into_document().len(), 8);
    }
}
