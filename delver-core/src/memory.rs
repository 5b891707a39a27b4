//! Long-term memory: the persisted record of completed research runs.
//!
//! One JSON document holding an ordered list of `RunRecord`s. The store
//! is loaded fully, appended to, and written back fully with an atomic
//! rename (write to a `.tmp` sibling, then rename) so a crash mid-write
//! never corrupts existing records. A missing or unreadable store is
//! treated as empty, never as a fatal error.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The persisted outcome of one completed research run. Append-only;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub topic: String,
    pub final_summary: String,
    /// URLs whose content contributed to the iteration summaries. May
    /// be empty.
    pub referenced_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(
        topic: impl Into<String>,
        final_summary: impl Into<String>,
        referenced_urls: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            final_summary: final_summary.into(),
            referenced_urls,
            created_at: Utc::now(),
        }
    }
}

/// File-backed store of run records.
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing file is an empty store; a corrupt
    /// file is logged and treated as empty.
    pub fn load(&self) -> Vec<RunRecord> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&data) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "memory store unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Append one record and persist the full store atomically.
    pub fn append(&self, record: &RunRecord) -> Result<(), MemoryError> {
        let mut records = self.load();
        records.push(record.clone());
        self.write_atomic(&records)
    }

    fn write_atomic(&self, records: &[RunRecord]) -> Result<(), MemoryError> {
        let persist_err = |message: String| MemoryError::PersistFailed {
            path: self.path.clone(),
            message,
        };

        let json =
            serde_json::to_string_pretty(records).map_err(|e| persist_err(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json.as_bytes()).map_err(|e| persist_err(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| persist_err(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> MemoryStore {
        MemoryStore::new(dir.path().join("memory.json"))
    }

    fn record(topic: &str) -> RunRecord {
        RunRecord::new(topic, "summary", vec!["https://a.example.com".to_string()])
    }

    #[test]
    fn test_load_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load().is_empty());
    }

    #[test]
    fn test_load_corrupt_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json!").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_append_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let rec = record("solid state batteries");
        store.append(&rec).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], rec);
    }

    #[test]
    fn test_append_preserves_existing_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let first = record("first");
        let second = record("second");
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].topic, "first");
        assert_eq!(loaded[1].topic, "second");
    }

    #[test]
    fn test_append_after_corruption_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "garbage").unwrap();

        store.append(&record("recovered")).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].topic, "recovered");
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path().join("nested").join("memory.json"));
        store.append(&record("nested")).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_atomic_write_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(&record("clean")).unwrap();
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_empty_referenced_urls_is_valid() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let rec = RunRecord::new("t", "s", Vec::new());
        store.append(&rec).unwrap();
        assert!(store.load()[0].referenced_urls.is_empty());
    }
}
