//! File-backed storage backend.
//!
//! The whole key space lives in one JSON document. Every mutation loads the
//! document, applies the batch, and commits by writing a temp file and
//! renaming it over the original, so a batch is never observable half-applied.

use crate::{StorageArea, StorageError, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Durable storage backed by a single JSON file.
pub struct FileStorage {
    path: PathBuf,
    // Serializes load-modify-commit cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) storage at the given path.
    pub fn new(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    fn load(&self) -> StorageResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Encoding(format!("Corrupt storage document: {}", e)))
    }

    fn commit(&self, data: &HashMap<String, String>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp_path = temp_path(&self.path);
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), keys = data.len(), "Committed storage document");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "storage".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

impl StorageArea for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, entries: &[(String, String)]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut data = self.load()?;
        for (key, value) in entries {
            data.insert(key.clone(), value.clone());
        }
        self.commit(&data)
    }

    fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut data = self.load()?;
        for key in keys {
            data.remove(*key);
        }
        self.commit(&data)
    }
}
