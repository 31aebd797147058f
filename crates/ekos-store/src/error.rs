//! Store error types.

use ekos_models::TransitionError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    /// Version mismatch on a compare-and-swap write.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Conflicting state that retrying will not resolve.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// True if the error was caused by a failed version precondition.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, StoreError::PreconditionFailed(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
