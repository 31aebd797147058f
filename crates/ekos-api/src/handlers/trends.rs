//! Trend handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map};

use ekos_models::{Content, ContentCreate, ContentId, ContentType, TaskId, TaskType, Trend, TrendId};
use ekos_trends::{trend_content_title, video_platforms};

use super::content::start_content;
use super::tasks::{start_task, TaskResponse};
use super::{LimitQuery, OrNotFound};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_TREND_LIMIT: usize = 20;
const DEFAULT_POPULAR_LIMIT: usize = 10;

/// Start a trend monitoring run.
pub async fn monitor_trends(State(state): State<AppState>) -> ApiResult<Json<TaskResponse>> {
    let mut parameters = Map::new();
    parameters.insert(
        "sources".to_string(),
        json!(["youtube", "google_trends", "rss_feeds"]),
    );
    let mut response = start_task(&state, TaskType::TrendMonitoring, parameters).await?;
    response.message = "Мониторинг трендов запущен".to_string();
    Ok(Json(response))
}

/// Most recently discovered trends.
pub async fn list_trends(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Trend>>> {
    Ok(Json(state.trends.recent(query.or(DEFAULT_TREND_LIMIT)).await?))
}

/// Trends by popularity.
pub async fn popular_trends(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Trend>>> {
    Ok(Json(state.trends.popular(query.or(DEFAULT_POPULAR_LIMIT)).await?))
}

#[derive(Debug, Serialize)]
pub struct TrendContentResponse {
    pub success: bool,
    pub content_id: ContentId,
    pub task_id: TaskId,
    pub message: String,
}

/// Turn a trend into a video draft and write its script.
pub async fn create_content_from_trend(
    State(state): State<AppState>,
    Path(trend_id): Path<String>,
) -> ApiResult<Json<TrendContentResponse>> {
    let trend = state
        .trends
        .get(&TrendId::from_string(trend_id))
        .await
        .or_not_found("Тренд не найден")?;

    let mut keywords = vec![trend.keyword.clone()];
    keywords.extend(trend.hashtags.iter().cloned());
    let content = Content::from_create(ContentCreate {
        content_type: ContentType::Video,
        title: trend_content_title(&trend.keyword),
        description: Some(format!("Контент создан на основе тренда: {}", trend.description)),
        topic: trend.keyword.clone(),
        keywords,
        target_platforms: video_platforms(),
        affiliate_links: Vec::new(),
    });

    let mut parameters = Map::new();
    parameters.insert("source_trend_id".to_string(), json!(trend.id));
    let (content_id, task_id) = start_content(&state, content, parameters).await?;

    Ok(Json(TrendContentResponse {
        success: true,
        content_id,
        task_id,
        message: format!("Контент на основе тренда '{}' создан", trend.keyword),
    }))
}
