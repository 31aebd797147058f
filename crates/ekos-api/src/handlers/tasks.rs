//! Task handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use validator::Validate;

use ekos_models::{
    ContentId, Platform, Task, TaskCreate, TaskId, TaskStatus, TaskType, TtsRequest, VideoParams,
};
use ekos_worker::{Job, VideoSource};

use super::video::resolve_audio;
use super::{ActionResponse, LimitQuery, OrNotFound};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_TASK_LIMIT: usize = 100;
const DEFAULT_VIDEO_TITLE: &str = "Видео";

/// Reply for a created task.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task_id: TaskId,
    pub message: String,
}

/// Status view of a task.
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<Task> for TaskStatusResponse {
    fn from(task: Task) -> Self {
        Self {
            message: task.status_message(),
            task_id: task.id,
            task_type: task.task_type,
            status: task.status,
            progress: task.progress,
            result: task.result,
            error_message: task.error_message,
        }
    }
}

/// Work a new task can start with, decided before the task is stored.
enum Planned {
    Tts(TtsRequest),
    Video {
        source: VideoSource,
        params: VideoParams,
    },
    TrendMonitoring,
    ContentGeneration(ContentId),
    Publish {
        content_id: ContentId,
        platforms: Vec<Platform>,
    },
}

impl Planned {
    fn into_job(self, task_id: TaskId) -> Job {
        match self {
            Planned::Tts(request) => Job::Tts {
                task_id,
                content_id: None,
                request,
            },
            Planned::Video { source, params } => Job::Video {
                task_id,
                source,
                params,
            },
            Planned::TrendMonitoring => Job::TrendMonitoring { task_id },
            Planned::ContentGeneration(content_id) => Job::ContentGeneration { task_id, content_id },
            Planned::Publish {
                content_id,
                platforms,
            } => Job::Publish {
                task_id,
                content_id,
                platforms,
            },
        }
    }
}

/// Decide which job `parameters` describe.
///
/// `None` means the task is stored as pending with nothing to run.
async fn plan(state: &AppState, task_type: TaskType, parameters: &Map<String, Value>) -> ApiResult<Option<Planned>> {
    let content_id = parameters
        .get("content_id")
        .and_then(Value::as_str)
        .map(ContentId::from_string);

    let planned = match task_type {
        TaskType::TrendMonitoring => Some(Planned::TrendMonitoring),
        TaskType::Analytics => None,
        TaskType::TtsGeneration => {
            if !parameters.contains_key("text") {
                return Ok(None);
            }
            let request: TtsRequest = serde_json::from_value(Value::Object(parameters.clone()))
                .map_err(|e| ApiError::bad_request(format!("Invalid TTS parameters: {e}")))?;
            request.validate()?;
            Some(Planned::Tts(request))
        }
        TaskType::VideoGeneration => {
            let Some(text) = parameters.get("text").and_then(Value::as_str) else {
                return Ok(None);
            };
            let params: VideoParams = serde_json::from_value(Value::Object(parameters.clone()))
                .map_err(|e| ApiError::bad_request(format!("Invalid video parameters: {e}")))?;
            params.validate()?;
            let title = parameters
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_VIDEO_TITLE);
            let audio_path = match parameters.get("audio_path").and_then(Value::as_str) {
                Some(path) => Some(resolve_audio(state, path).await?),
                None => None,
            };
            Some(Planned::Video {
                source: VideoSource::Text {
                    title: title.to_string(),
                    text: text.to_string(),
                    audio_path,
                },
                params,
            })
        }
        TaskType::ContentGeneration => match content_id {
            Some(id) => {
                state.content.get(&id).await.or_not_found("Content not found")?;
                Some(Planned::ContentGeneration(id))
            }
            None => None,
        },
        TaskType::Publishing => match content_id {
            Some(id) => {
                state.content.get(&id).await.or_not_found("Content not found")?;
                Some(Planned::Publish {
                    content_id: id,
                    platforms: parse_platforms(parameters.get("platforms"))?,
                })
            }
            None => None,
        },
    };
    Ok(planned)
}

fn parse_platforms(value: Option<&Value>) -> ApiResult<Vec<Platform>> {
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| ApiError::bad_request("platforms must be strings"))?
                .parse::<Platform>()
                .map_err(ApiError::bad_request)
        })
        .collect()
}

/// Store a task and start its job when the parameters describe one.
pub(crate) async fn start_task(
    state: &AppState,
    task_type: TaskType,
    parameters: Map<String, Value>,
) -> ApiResult<TaskResponse> {
    let planned = plan(state, task_type, &parameters).await?;
    let task = state.tracker.create_task(task_type, parameters).await?;

    match planned {
        Some(planned) => state.submit(planned.into_job(task.id.clone())).await?,
        None => info!(task_id = %task.id, task_type = %task_type, "Task stored without a job"),
    }

    Ok(TaskResponse {
        success: true,
        message: format!("Задача {task_type} создана успешно"),
        task_id: task.id,
    })
}

/// Create a task.
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<TaskCreate>,
) -> ApiResult<Json<TaskResponse>> {
    start_task(&state, request.task_type, request.parameters).await.map(Json)
}

/// Body of the legacy task endpoint.
#[derive(Debug, Deserialize)]
pub struct LegacyTaskCreate {
    #[serde(rename = "type", default = "default_legacy_type")]
    pub task_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_legacy_type() -> String {
    TaskType::ContentGeneration.as_str().to_string()
}

/// Create a task from a free-form type string.
pub async fn create_task_legacy(
    State(state): State<AppState>,
    Json(request): Json<LegacyTaskCreate>,
) -> ApiResult<Json<TaskResponse>> {
    let task_type: TaskType = serde_json::from_value(Value::String(request.task_type.clone()))
        .map_err(|_| ApiError::bad_request(format!("Unknown task type: {}", request.task_type)))?;
    start_task(&state, task_type, request.parameters).await.map(Json)
}

/// List tasks, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.tracker.list_tasks(query.or(DEFAULT_TASK_LIMIT)).await?;
    Ok(Json(tasks))
}

/// Status of one task.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let task = state
        .tracker
        .get_task(&TaskId::from_string(task_id))
        .await
        .or_not_found("Задача не найдена")?;
    Ok(Json(task.into()))
}

/// Pause a task. Finished tasks cannot be paused.
pub async fn pause_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ActionResponse>> {
    state
        .tracker
        .pause(&TaskId::from_string(task_id))
        .await
        .or_not_found("Задача не найдена")?;
    Ok(Json(ActionResponse::ok("Задача приостановлена")))
}

/// Delete a task record.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<ActionResponse>> {
    if !state.tracker.delete_task(&TaskId::from_string(task_id)).await? {
        return Err(ApiError::not_found("Задача не найдена"));
    }
    Ok(Json(ActionResponse::ok("Задача удалена")))
}
