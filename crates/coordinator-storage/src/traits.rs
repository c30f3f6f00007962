//! Storage trait definitions.

use crate::StorageResult;

/// Trait for durable key-value storage backends.
///
/// Batch mutations are atomic: a `set` or `remove` call either applies every
/// entry or none, and readers never observe a partially applied batch.
pub trait StorageArea: Send + Sync {
    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a batch of values atomically
    fn set(&self, entries: &[(String, String)]) -> StorageResult<()>;

    /// Remove a batch of keys atomically
    fn remove(&self, keys: &[&str]) -> StorageResult<()>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
