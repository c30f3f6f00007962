//! Durable key-value storage for the Worklens coordinator.
//!
//! This crate provides:
//! - **FileStorage**: a single JSON document on disk, every mutation
//!   committed atomically via temp file + rename
//! - **MemoryStorage**: an in-memory backend for tests
//! - **SessionStore**: the high-level API for the one persisted entity,
//!   the authentication `Session`

mod file;
mod keys;
mod memory;
mod session;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session::{Session, SessionStore, UserProfile};
pub use traits::StorageArea;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-level storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default file-backed storage at the standard location.
pub fn create_storage(paths: &coordinator_config_and_utils::Paths) -> StorageResult<Box<dyn StorageArea>> {
    let storage = FileStorage::new(paths.session_store_file())?;
    Ok(Box::new(storage))
}

/// Create a SessionStore with the default file-backed storage.
pub fn create_session_store(paths: &coordinator_config_and_utils::Paths) -> StorageResult<SessionStore> {
    let storage = create_storage(paths)?;
    Ok(SessionStore::new(storage))
}
