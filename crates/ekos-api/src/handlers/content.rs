//! Content handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use validator::Validate;

use ekos_models::{
    Content, ContentCreate, ContentId, ContentType, GenerationSlot, Platform, TaskId, TaskType,
    TtsEngineKind, TtsLanguage, TtsRequest, TtsVoice, VideoParams,
};
use ekos_store::StoreError;
use ekos_worker::{Job, VideoSource};

use super::{LimitQuery, OrNotFound};
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_generation_conflict;
use crate::state::AppState;

const DEFAULT_CONTENT_LIMIT: usize = 50;
const UNTITLED: &str = "Без названия";

/// Reply for created content.
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub success: bool,
    pub content_id: ContentId,
    pub task_id: TaskId,
    pub message: String,
}

/// Reply for a generation started on existing content.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub task_id: TaskId,
    pub content_id: ContentId,
    pub message: String,
}

/// Store `content` and start writing its script.
pub(crate) async fn start_content(
    state: &AppState,
    content: Content,
    mut parameters: Map<String, Value>,
) -> ApiResult<(ContentId, TaskId)> {
    let content = state.content.create(&content).await?;

    parameters.insert("content_id".to_string(), json!(content.id));
    let task = state
        .tracker
        .create_task(TaskType::ContentGeneration, parameters)
        .await?;
    state.content.set_generation_task(&content.id, &task.id).await?;

    state
        .submit(Job::ContentGeneration {
            task_id: task.id.clone(),
            content_id: content.id.clone(),
        })
        .await?;

    info!(content_id = %content.id, task_id = %task.id, "Content created");
    Ok((content.id, task.id))
}

async fn create(state: &AppState, request: ContentCreate) -> ApiResult<ContentResponse> {
    request.validate()?;

    let mut parameters = Map::new();
    parameters.insert("content_type".to_string(), json!(request.content_type));
    parameters.insert("topic".to_string(), json!(request.topic));
    parameters.insert("description".to_string(), json!(request.description));

    let (content_id, task_id) = start_content(state, Content::from_create(request), parameters).await?;
    Ok(ContentResponse {
        success: true,
        content_id,
        task_id,
        message: "Контент создан, генерация запущена".to_string(),
    })
}

/// Create a content draft and start script generation.
pub async fn create_content(
    State(state): State<AppState>,
    Json(request): Json<ContentCreate>,
) -> ApiResult<Json<ContentResponse>> {
    create(&state, request).await.map(Json)
}

/// Body of the legacy content endpoint.
#[derive(Debug, Deserialize)]
pub struct LegacyContentRequest {
    #[serde(rename = "type", default)]
    pub content_type: ContentType,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_platforms() -> Vec<Platform> {
    vec![Platform::Telegram]
}

impl From<LegacyContentRequest> for ContentCreate {
    fn from(request: LegacyContentRequest) -> Self {
        let topic = request.topic.unwrap_or_default();
        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| Some(topic.clone()).filter(|t| !t.trim().is_empty()))
            .unwrap_or_else(|| UNTITLED.to_string());

        ContentCreate {
            content_type: request.content_type,
            title,
            description: request.description,
            topic,
            keywords: request.keywords,
            target_platforms: request.platforms,
            affiliate_links: Vec::new(),
        }
    }
}

/// Create content from the legacy request shape.
pub async fn generate_content_legacy(
    State(state): State<AppState>,
    Json(request): Json<LegacyContentRequest>,
) -> ApiResult<Json<ContentResponse>> {
    create(&state, request.into()).await.map(Json)
}

/// List content, newest first.
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Content>>> {
    let content = state.content.list(query.or(DEFAULT_CONTENT_LIMIT)).await?;
    Ok(Json(content))
}

/// One content record.
pub async fn get_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> ApiResult<Json<Content>> {
    let content = state
        .content
        .get(&ContentId::from_string(content_id))
        .await
        .or_not_found("Контент не найден")?;
    Ok(Json(content))
}

/// Make `task_id` the writer of `slot`, dropping the task if another
/// generation is still active.
async fn claim_generation(
    state: &AppState,
    content_id: &ContentId,
    slot: GenerationSlot,
    task_id: &TaskId,
) -> ApiResult<()> {
    let claim = state
        .content
        .claim_slot(content_id, slot, task_id, &state.tracker)
        .await;
    let Err(e) = claim else {
        return Ok(());
    };

    if let Err(cleanup) = state.tracker.delete_task(task_id).await {
        warn!(task_id = %task_id, error = %cleanup, "Failed to remove unclaimed task");
    }
    if matches!(e, StoreError::Conflict(_)) {
        record_generation_conflict(slot.as_str());
        warn!(content_id = %content_id, slot = %slot, "Generation already in progress");
    }
    Err(e.into())
}

/// Optional speech settings for content narration.
#[derive(Debug, Default, Deserialize)]
pub struct TtsOptions {
    pub language: Option<TtsLanguage>,
    pub voice: Option<TtsVoice>,
    pub speed: Option<f32>,
    pub engine: Option<TtsEngineKind>,
}

/// Narrate a content record.
pub async fn generate_content_tts(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    options: Option<Json<TtsOptions>>,
) -> ApiResult<Json<GenerationResponse>> {
    let content_id = ContentId::from_string(content_id);
    let content = state.content.get(&content_id).await.or_not_found("Контент не найден")?;
    let text = content
        .narration_text()
        .ok_or_else(|| ApiError::bad_request("У контента нет текста для озвучки"))?;

    let options = options.map(|Json(o)| o).unwrap_or_default();
    let request = TtsRequest {
        text: text.to_string(),
        language: options.language.unwrap_or_default(),
        voice: options.voice.unwrap_or_default(),
        speed: options.speed.unwrap_or(1.0),
        engine: options.engine.unwrap_or_default(),
    };
    request.validate()?;

    let mut parameters = super::object(&request)?;
    parameters.insert("content_id".to_string(), json!(content_id));
    let task = state
        .tracker
        .create_task(TaskType::TtsGeneration, parameters)
        .await?;
    claim_generation(&state, &content_id, GenerationSlot::Tts, &task.id).await?;

    state
        .submit(Job::Tts {
            task_id: task.id.clone(),
            content_id: Some(content_id.clone()),
            request,
        })
        .await?;

    Ok(Json(GenerationResponse {
        success: true,
        task_id: task.id,
        content_id,
        message: "TTS генерация для контента запущена".to_string(),
    }))
}

/// Render a video for a content record.
pub async fn generate_content_video(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    params: Option<Json<VideoParams>>,
) -> ApiResult<Json<GenerationResponse>> {
    let content_id = ContentId::from_string(content_id);
    let content = state.content.get(&content_id).await.or_not_found("Контент не найден")?;
    if content.narration_text().is_none() {
        return Err(ApiError::bad_request("У контента нет текста для видео"));
    }

    let params = params.map(|Json(p)| p).unwrap_or_default();
    params.validate()?;

    let mut parameters = super::object(&params)?;
    parameters.insert("content_id".to_string(), json!(content_id));
    let task = state
        .tracker
        .create_task(TaskType::VideoGeneration, parameters)
        .await?;
    claim_generation(&state, &content_id, GenerationSlot::Video, &task.id).await?;

    state
        .submit(Job::Video {
            task_id: task.id.clone(),
            source: VideoSource::Content(content_id.clone()),
            params,
        })
        .await?;

    Ok(Json(GenerationResponse {
        success: true,
        task_id: task.id,
        content_id,
        message: "Генерация видео для контента запущена".to_string(),
    }))
}

/// Optional body of the publish endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

/// Publish a content record.
///
/// Without platforms the content's target platforms are used.
pub async fn publish_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    request: Option<Json<PublishRequest>>,
) -> ApiResult<Json<GenerationResponse>> {
    let content_id = ContentId::from_string(content_id);
    state.content.get(&content_id).await.or_not_found("Контент не найден")?;

    let platforms = request.map(|Json(r)| r.platforms).unwrap_or_default();
    let mut parameters = Map::new();
    parameters.insert("content_id".to_string(), json!(content_id));
    parameters.insert("platforms".to_string(), json!(platforms));
    let task = state.tracker.create_task(TaskType::Publishing, parameters).await?;

    state
        .submit(Job::Publish {
            task_id: task.id.clone(),
            content_id: content_id.clone(),
            platforms,
        })
        .await?;

    Ok(Json(GenerationResponse {
        success: true,
        task_id: task.id,
        content_id,
        message: "Публикация запущена".to_string(),
    }))
}
