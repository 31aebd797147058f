//! Health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// Version banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": format!("EKOSYSTEMA_FULL API v{}", env!("CARGO_PKG_VERSION")),
    }))
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub store: CheckStatus,
    pub ffmpeg: CheckStatus,
    pub tts: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(latency_ms: Option<u64>) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            latency_ms,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }
}

/// Readiness check endpoint (readiness probe).
///
/// Only the document store is required; missing media tools are reported
/// but do not fail the probe.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let store_check = {
        let start = Instant::now();
        match state.store.ping().await {
            Ok(()) => CheckStatus::ok(Some(start.elapsed().as_millis() as u64)),
            Err(e) => CheckStatus::error(e.to_string()),
        }
    };

    let ffmpeg_check = if state.video.info().ffmpeg_available {
        CheckStatus::ok(None)
    } else {
        CheckStatus::error("ffmpeg not found")
    };

    let tts_check = if state.tts.info().available_engines.is_empty() {
        CheckStatus::error("no TTS engine available")
    } else {
        CheckStatus::ok(None)
    };

    let store_ok = store_check.status == "ok";
    let response = ReadinessResponse {
        status: if store_ok { "ready" } else { "not_ready" }.to_string(),
        checks: ReadinessChecks {
            store: store_check,
            ffmpeg: ffmpeg_check,
            tts: tts_check,
        },
    };

    if store_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
