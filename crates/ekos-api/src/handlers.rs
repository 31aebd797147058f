//! Request handlers.

pub mod analytics;
pub mod content;
pub mod dashboard;
pub mod health;
pub mod publications;
pub mod settings;
pub mod tasks;
pub mod trends;
pub mod tts;
pub mod video;

pub use health::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ekos_store::StoreResult;

use crate::error::{ApiError, ApiResult};

/// `?limit=` query for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// Requested limit, or `default`, capped at 500.
    pub fn or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, 500)
    }
}

/// Generic `{success, message}` reply.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Replace a store `NotFound` with a readable 404.
pub(crate) trait OrNotFound<T> {
    fn or_not_found(self, what: &str) -> ApiResult<T>;
}

impl<T> OrNotFound<T> for StoreResult<T> {
    fn or_not_found(self, what: &str) -> ApiResult<T> {
        self.map_err(|e| {
            if e.is_not_found() {
                ApiError::not_found(what)
            } else {
                ApiError::from(e)
            }
        })
    }
}

/// Serialize `value` into task parameters.
pub(crate) fn object<T: Serialize>(value: &T) -> ApiResult<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::internal(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}
