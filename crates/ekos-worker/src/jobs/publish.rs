//! Publishing job.

use serde_json::json;

use ekos_models::{ContentId, Platform, Publication, PublicationStatus, TaskId};

use super::{to_map, JobContext, JobOutcome};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics::record_publication;

pub(super) async fn run(
    ctx: &JobContext,
    task_id: &TaskId,
    content_id: &ContentId,
    platforms: &[Platform],
    logger: &JobLogger,
) -> WorkerResult<JobOutcome> {
    ctx.tracker.start(task_id, 10).await?;

    let content = ctx.content.get(content_id).await?;
    let targets: Vec<Platform> = if platforms.is_empty() {
        content.target_platforms.clone()
    } else {
        platforms.to_vec()
    };
    if targets.is_empty() {
        return Err(WorkerError::job_failed(format!(
            "content {content_id} has no target platforms"
        )));
    }

    let mut published = Vec::new();
    let mut failures = Vec::new();
    for (i, platform) in targets.iter().copied().enumerate() {
        let publication = match ctx.publishers.publish(platform, &content).await {
            Ok(post_id) => {
                logger.log_progress(&format!("Published to {platform} as {post_id}"));
                Publication::published(content.id.clone(), platform, post_id)
            }
            Err(e) => {
                logger.log_warning(&format!("Publishing to {platform} failed: {e}"));
                failures.push(format!("{platform}: {e}"));
                Publication::failed(content.id.clone(), platform, e.to_string())
            }
        };
        let ok = publication.status == PublicationStatus::Published;
        record_publication(platform.as_str(), ok);
        let stored = ctx.publications.create(&publication).await?;
        if ok {
            published.push(stored.id);
        }

        let progress = 10 + (80 * (i + 1) / targets.len()) as u8;
        ctx.tracker.set_progress(task_id, progress).await?;
    }

    if !published.is_empty() {
        ctx.content.mark_published(content_id).await?;
    }

    if !failures.is_empty() {
        return Err(WorkerError::publish_failed(failures.join("; ")));
    }

    logger.log_completion(&format!("Published to {} platforms", published.len()));
    Ok(JobOutcome::new(to_map(json!({
        "content_id": content_id,
        "platforms": targets,
        "publication_ids": published,
    }))))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Map;

    use ekos_models::{Content, ContentCreate, ContentStatus, TaskType};

    use super::*;
    use crate::jobs::testing::{context, RecordingPublisher};
    use crate::publish::PublisherRegistry;

    async fn setup(ctx: &JobContext, platforms: Vec<Platform>) -> (Content, TaskId) {
        let content = ctx
            .content
            .create(&Content::from_create(ContentCreate {
                content_type: Default::default(),
                title: "Gifts".to_string(),
                description: None,
                topic: String::new(),
                keywords: vec![],
                target_platforms: platforms,
                affiliate_links: vec![],
            }))
            .await
            .unwrap();
        let task = ctx.tracker.create_task(TaskType::Publishing, Map::new()).await.unwrap();
        (content, task.id)
    }

    #[tokio::test]
    async fn test_publish_to_target_platforms() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), vec![]);
        let publisher = Arc::new(RecordingPublisher::default());
        ctx.publishers = PublisherRegistry::new().with_publisher(publisher.clone());
        let (content, task_id) = setup(&ctx, vec![Platform::Telegram]).await;
        let logger = JobLogger::new(&task_id, "publishing");

        let outcome = run(&ctx, &task_id, &content.id, &[], &logger).await.unwrap();

        assert_eq!(outcome.result["publication_ids"].as_array().unwrap().len(), 1);
        assert_eq!(publisher.posted.lock().unwrap().as_slice(), [content.id.to_string()]);
        let publications = ctx.publications.list_for_content(&content.id).await.unwrap();
        assert_eq!(publications[0].platform_post_id.as_deref(), Some("post-1"));
        assert_eq!(ctx.content.get(&content.id).await.unwrap().status, ContentStatus::Published);
    }

    #[tokio::test]
    async fn test_unsupported_platform_records_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let (content, task_id) = setup(&ctx, vec![]).await;
        let logger = JobLogger::new(&task_id, "publishing");

        let err = run(&ctx, &task_id, &content.id, &[Platform::Telegram, Platform::Tiktok], &logger)
            .await
            .unwrap_err();

        assert!(matches!(&err, WorkerError::PublishFailed(msg) if msg.starts_with("tiktok:")));
        let publications = ctx.publications.list_for_content(&content.id).await.unwrap();
        assert_eq!(publications.len(), 2);
        let failed: Vec<_> = publications
            .iter()
            .filter(|p| p.status == PublicationStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].platform, Platform::Tiktok);
        // Telegram succeeded, so the content still counts as published.
        assert_eq!(ctx.content.get(&content.id).await.unwrap().status, ContentStatus::Published);
    }

    #[tokio::test]
    async fn test_no_platforms_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let (content, task_id) = setup(&ctx, vec![]).await;
        let logger = JobLogger::new(&task_id, "publishing");

        let err = run(&ctx, &task_id, &content.id, &[], &logger).await.unwrap_err();
        assert!(matches!(err, WorkerError::JobFailed(_)));
        assert!(ctx.publications.list_all().await.unwrap().is_empty());
    }
}
