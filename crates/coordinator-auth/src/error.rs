//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Identity broker failed or the user cancelled the provider flow
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Backend rejected the token exchange
    #[error("Token exchange rejected: {0}")]
    Exchange(String),

    /// A handed-off token was definitively rejected by the authority
    #[error("Handoff token is invalid")]
    InvalidHandoffToken,

    /// The token validator could not be reached (network-level; distinct
    /// from a definitive rejection)
    #[error("Token validator unavailable")]
    ValidatorUnavailable,

    /// Backend request failed (non-exchange endpoints, e.g. revoke)
    #[error("Backend request failed: {0}")]
    Backend(String),

    /// Invalid state transition in the auth FSM
    #[error("Invalid auth state transition: {0}")]
    InvalidStateTransition(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] coordinator_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns true if this error means the session itself was rejected by
    /// the remote authority, as opposed to the authority being unreachable.
    ///
    /// Only definitive rejections may clear a persisted session.
    pub fn is_definitive_rejection(&self) -> bool {
        matches!(self, AuthError::InvalidHandoffToken)
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
