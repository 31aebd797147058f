//! Video generation handlers.

use std::path::PathBuf;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use ekos_media::VideoInfo;
use ekos_models::{TaskType, VideoParams};
use ekos_worker::{Job, VideoSource};

use super::tasks::TaskResponse;
use super::tts::DataResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Video types, styles and resolutions.
pub async fn video_info(State(state): State<AppState>) -> Json<DataResponse<VideoInfo>> {
    Json(DataResponse {
        success: true,
        data: state.video.info(),
    })
}

/// Body of a free-text video request.
#[derive(Debug, Deserialize, Serialize)]
pub struct VideoGenerateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Narration previously written by the speech endpoint
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(flatten)]
    pub params: VideoParams,
}

/// Accept only audio files inside the speech output directory.
pub(crate) async fn resolve_audio(state: &AppState, path: &str) -> ApiResult<PathBuf> {
    let invalid = || ApiError::bad_request("audio_path must point to generated audio");
    let audio_dir = tokio::fs::canonicalize(state.tts.audio_dir())
        .await
        .map_err(|_| invalid())?;
    let audio = tokio::fs::canonicalize(path).await.map_err(|_| invalid())?;
    if !audio.starts_with(&audio_dir) {
        return Err(invalid());
    }
    match tokio::fs::metadata(&audio).await {
        Ok(meta) if meta.is_file() => Ok(audio),
        _ => Err(invalid()),
    }
}

/// Render a video from free text in the background.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(request): Json<VideoGenerateRequest>,
) -> ApiResult<Json<TaskResponse>> {
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request("Текст не может быть пустым"));
    }
    request.params.validate()?;

    let audio_path = match request.audio_path.as_deref() {
        Some(path) => Some(resolve_audio(&state, path).await?),
        None => None,
    };

    let parameters = super::object(&request)?;
    let task = state
        .tracker
        .create_task(TaskType::VideoGeneration, parameters)
        .await?;

    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| request.text.chars().take(60).collect());
    state
        .submit(Job::Video {
            task_id: task.id.clone(),
            source: VideoSource::Text {
                title,
                text: request.text,
                audio_path,
            },
            params: request.params,
        })
        .await?;

    Ok(Json(TaskResponse {
        success: true,
        task_id: task.id,
        message: "Генерация видео запущена".to_string(),
    }))
}
