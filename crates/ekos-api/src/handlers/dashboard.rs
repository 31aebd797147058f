//! Dashboard overview.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use ekos_models::{Content, PublicationStatus, Task, TaskStatus};

use crate::error::ApiResult;
use crate::state::AppState;

const RECENT_TASKS: usize = 10;
const RECENT_CONTENT: usize = 5;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_content: usize,
    pub pending_tasks: usize,
    pub running_tasks: usize,
    pub failed_tasks: usize,
    pub published_today: usize,
    pub total_trends: usize,
    pub jobs_in_flight: usize,
    pub system_status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_tasks: Vec<Task>,
    pub recent_content: Vec<Content>,
    pub tasks_by_status: BTreeMap<&'static str, usize>,
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardResponse>> {
    let mut tasks = state.tracker.all_tasks().await?;
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut content = state.content.list_all().await?;
    content.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let publications = state.publications.list_all().await?;
    let total_trends = state.trends.recent(usize::MAX).await?.len();

    let mut tasks_by_status = BTreeMap::new();
    for task in &tasks {
        *tasks_by_status.entry(task.status.as_str()).or_insert(0) += 1;
    }
    let count = |status: TaskStatus| tasks_by_status.get(status.as_str()).copied().unwrap_or(0);

    let today = Utc::now().date_naive();
    let published_today = publications
        .iter()
        .filter(|p| p.status == PublicationStatus::Published)
        .filter(|p| p.published_at.is_some_and(|at| at.date_naive() == today))
        .count();

    let stats = DashboardStats {
        total_content: content.len(),
        pending_tasks: count(TaskStatus::Pending),
        running_tasks: count(TaskStatus::Running),
        failed_tasks: count(TaskStatus::Failed),
        published_today,
        total_trends,
        jobs_in_flight: state.executor.in_flight(),
        system_status: "active",
    };

    tasks.truncate(RECENT_TASKS);
    content.truncate(RECENT_CONTENT);

    Ok(Json(DashboardResponse {
        stats,
        recent_tasks: tasks,
        recent_content: content,
        tasks_by_status,
    }))
}
