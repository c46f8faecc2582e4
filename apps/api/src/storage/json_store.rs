use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

const DOCUMENT_FILE: &str = "profile.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed document store rooted at `data_dir`.
///
/// Layout: `{data_dir}/{key}/profile.json`. A reader never sees a partially
/// written document; two writers of the same key are not isolated from each
/// other (last rename wins). Callers that read-modify-write must serialize
/// per key themselves.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: Arc<PathBuf>,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(data_dir.into()),
        }
    }

    /// Path of the document for `key`. Rejects keys that could escape the root.
    pub fn document_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key).join(DOCUMENT_FILE))
    }

    /// Returns `Ok(None)` when no document exists for `key`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.document_path(key)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(key, "Document not found");
                return Ok(None);
            }
            Err(source) => {
                error!(key, "Failed to read document: {source}");
                return Err(StoreError::Io { path, source });
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => {
                info!(key, "Loaded document");
                Ok(Some(doc))
            }
            Err(source) => {
                error!(key, "Invalid JSON in document: {source}");
                Err(StoreError::Parse { path, source })
            }
        }
    }

    /// Writes `doc` to a temp file next to the target, then renames it over
    /// the target. On failure the temp file is removed (dropping a
    /// `NamedTempFile` deletes it) and the previous document stays intact.
    pub fn save<T: Serialize>(&self, key: &str, doc: &T) -> Result<(), StoreError> {
        let path = self.document_path(key)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.to_path_buf());

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, doc).map_err(|source| {
                error!(key, "Failed to serialize document: {source}");
                StoreError::Serialize {
                    path: path.clone(),
                    source,
                }
            })?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;

        tmp.persist(&path).map_err(|e| {
            error!(key, "Failed to replace document: {}", e.error);
            io_err(e.error)
        })?;

        info!(key, "Saved document");
        Ok(())
    }

    /// Returns whether a document existed.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.document_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(key, "Deleted document");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(key, "Document not found for deletion");
                Ok(false)
            }
            Err(source) => {
                error!(key, "Failed to delete document: {source}");
                Err(StoreError::Io { path, source })
            }
        }
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        (dir, store)
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_load_missing_is_absent_not_error() {
        let (_dir, store) = store();
        let doc: Option<Value> = store.load("nobody").unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_save_then_load_returns_equal_document() {
        let (_dir, store) = store();
        let doc = json!({"user": {"name": "Jane"}, "jobs": [{"id": "job-1"}]});
        store.save("u1", &doc).unwrap();
        let loaded: Value = store.load("u1").unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_document_lives_under_key_directory() {
        let (dir, store) = store();
        store.save("u1", &json!({"a": 1})).unwrap();
        assert!(dir.path().join("u1").join("profile.json").is_file());
        assert_eq!(files_in(&dir.path().join("u1")), vec!["profile.json"]);
    }

    #[test]
    fn test_corrupt_document_is_storage_failure() {
        let (dir, store) = store();
        fs::create_dir_all(dir.path().join("u1")).unwrap();
        fs::write(dir.path().join("u1/profile.json"), b"{\"user\": ").unwrap();
        let err = store.load::<Value>("u1").unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_failed_write_keeps_previous_document_and_cleans_temp() {
        let (dir, store) = store();
        let original = json!({"version": 1});
        store.save("u1", &original).unwrap();

        // Tuple keys cannot be JSON object keys, so serialization fails mid-write.
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        let err = store.save("u1", &bad).unwrap_err();
        assert!(matches!(err, StoreError::Serialize { .. }));

        let loaded: Value = store.load("u1").unwrap().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(files_in(&dir.path().join("u1")), vec!["profile.json"]);
    }

    #[test]
    fn test_interrupted_writer_never_exposes_partial_document() {
        let (dir, store) = store();
        let original = json!({"version": 1, "jobs": ["a", "b"]});
        store.save("u1", &original).unwrap();

        // A writer that died after writing half a temp file, before the rename.
        let mut orphan = NamedTempFile::new_in(dir.path().join("u1")).unwrap();
        orphan.write_all(b"{\"version\": 2, \"jobs\": [").unwrap();
        let (_file, _orphan_path) = orphan.keep().unwrap();

        let loaded: Value = store.load("u1").unwrap().unwrap();
        assert_eq!(loaded, original);

        let next = json!({"version": 2, "jobs": []});
        store.save("u1", &next).unwrap();
        let loaded: Value = store.load("u1").unwrap().unwrap();
        assert_eq!(loaded, next);
    }

    #[test]
    fn test_delete_reports_existence() {
        let (_dir, store) = store();
        store.save("u1", &json!({})).unwrap();
        assert!(store.delete("u1").unwrap());
        assert!(!store.delete("u1").unwrap());
        assert!(store.load::<Value>("u1").unwrap().is_none());
    }

    #[test]
    fn test_keys_that_escape_root_are_rejected() {
        let (_dir, store) = store();
        for key in ["", ".", "..", "../etc", "a/b", "a\\b"] {
            assert!(
                matches!(store.load::<Value>(key), Err(StoreError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }
}
