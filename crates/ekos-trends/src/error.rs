//! Trend collection error types.

use thiserror::Error;

/// Result type for trend operations.
pub type TrendResult<T> = Result<T, TrendError>;

/// Errors from feed fetching, parsing and idea generation.
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed {url} returned status {status}")]
    FeedStatus { url: String, status: u16 },

    #[error("Feed parse error: {0}")]
    FeedParse(String),

    #[error("Idea generation failed: {0}")]
    IdeaFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrendError {
    pub fn feed_parse(msg: impl Into<String>) -> Self {
        Self::FeedParse(msg.into())
    }

    pub fn idea_failed(msg: impl Into<String>) -> Self {
        Self::IdeaFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
