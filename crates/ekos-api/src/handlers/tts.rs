//! Speech synthesis handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::Validate;

use ekos_media::TtsInfo;
use ekos_models::{TaskType, TtsRequest};
use ekos_worker::Job;

use super::tasks::TaskResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `{success, data}` wrapper used by the info endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Engines, voices and languages.
pub async fn tts_info(State(state): State<AppState>) -> Json<DataResponse<TtsInfo>> {
    Json(DataResponse {
        success: true,
        data: state.tts.info(),
    })
}

/// Synthesize free text in the background.
pub async fn generate_tts(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Json<TaskResponse>> {
    let blank = body
        .get("text")
        .and_then(Value::as_str)
        .map_or(true, |t| t.trim().is_empty());
    if blank {
        return Err(ApiError::bad_request("Текст не может быть пустым"));
    }

    let request: TtsRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::bad_request(format!("Invalid TTS request: {e}")))?;
    request.validate()?;

    let task = state
        .tracker
        .create_task(TaskType::TtsGeneration, super::object(&request)?)
        .await?;
    state
        .submit(Job::Tts {
            task_id: task.id.clone(),
            content_id: None,
            request,
        })
        .await?;

    Ok(Json(TaskResponse {
        success: true,
        task_id: task.id,
        message: "TTS генерация запущена".to_string(),
    }))
}
