//! In-memory storage backend.

use crate::{StorageArea, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory storage, used by tests across the workspace.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn set(&self, entries: &[(String, String)]) -> StorageResult<()> {
        let mut data = self.data.lock().unwrap();
        for (key, value) in entries {
            data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let mut data = self.data.lock().unwrap();
        for key in keys {
            data.remove(*key);
        }
        Ok(())
    }
}
