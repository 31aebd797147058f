//! Trend monitoring job.

use serde_json::{json, Map, Value};

use ekos_models::{Content, ContentCreate, ContentType, TaskId, TaskType};
use ekos_trends::{ideas_for_trends, monitored_content_title, video_platforms};

use super::{to_map, Job, JobContext, JobOutcome};
use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Trends considered for automatic content per run.
const AUTO_CONTENT_TRENDS: usize = 5;

/// Minimum popularity for automatic content.
const AUTO_CONTENT_MIN_SCORE: f64 = 0.6;

pub(super) async fn run(ctx: &JobContext, task_id: &TaskId, logger: &JobLogger) -> WorkerResult<JobOutcome> {
    ctx.tracker.start(task_id, 10).await?;

    let settings = ctx.settings.get().await?;
    let keywords = settings.trend_monitoring.keywords;
    logger.log_progress(&format!("Collecting trends for {} keywords", keywords.len()));

    let mut trends = ctx.collector.collect(&keywords).await;
    trends.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
    let saved = ctx.trends.save_all(&trends).await?;
    ctx.tracker.set_progress(task_id, 50).await?;
    logger.log_progress(&format!("Stored {saved} trends"));

    let ideas = ideas_for_trends(&trends);

    let mut content_ids = Vec::new();
    let mut follow_ups = Vec::new();
    for trend in trends
        .iter()
        .take(AUTO_CONTENT_TRENDS)
        .filter(|t| t.popularity_score > AUTO_CONTENT_MIN_SCORE)
    {
        let mut keywords = vec![trend.keyword.clone()];
        keywords.extend(trend.hashtags.iter().cloned());

        let content = ctx
            .content
            .create(&Content::from_create(ContentCreate {
                content_type: ContentType::Video,
                title: monitored_content_title(&trend.keyword),
                description: Some(format!(
                    "Автоматически создано на основе тренда: {}",
                    trend.description
                )),
                topic: trend.keyword.clone(),
                keywords,
                target_platforms: video_platforms(),
                affiliate_links: vec![],
            }))
            .await?;

        let mut params = Map::new();
        params.insert("content_id".to_string(), json!(content.id));
        params.insert("auto_generated".to_string(), Value::Bool(true));
        params.insert("source_trend_id".to_string(), json!(trend.id));
        let task = ctx.tracker.create_task(TaskType::ContentGeneration, params).await?;
        ctx.content.set_generation_task(&content.id, &task.id).await?;

        follow_ups.push(Job::ContentGeneration {
            task_id: task.id,
            content_id: content.id.clone(),
        });
        content_ids.push(content.id);
    }

    logger.log_completion(&format!(
        "{} trends, {} content drafts",
        trends.len(),
        content_ids.len()
    ));
    Ok(JobOutcome {
        result: to_map(json!({
            "trends_found": trends.len(),
            "content_tasks_created": content_ids.len(),
            "content_ideas": ideas,
            "content_ids": content_ids,
        })),
        follow_ups,
    })
}
