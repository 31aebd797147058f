//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Executor is shutting down")]
    ShuttingDown,

    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    #[error("Publishing to {0} is not supported")]
    Unsupported(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(#[from] ekos_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] ekos_media::MediaError),

    #[error("Trend error: {0}")]
    Trend(#[from] ekos_trends::TrendError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the error came from the single-writer guard on a content slot.
    pub fn is_conflict(&self) -> bool {
        matches!(self, WorkerError::Store(ekos_store::StoreError::Conflict(_)))
    }
}
