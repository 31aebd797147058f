//! Speech synthesis job.

use serde_json::json;

use ekos_models::{ContentId, GenerationSlot, TaskId, TtsRequest};
use ekos_store::Artifact;

use super::{to_map, JobContext, JobOutcome};
use crate::error::WorkerResult;
use crate::logging::JobLogger;

pub(super) async fn run(
    ctx: &JobContext,
    task_id: &TaskId,
    content_id: Option<&ContentId>,
    request: &TtsRequest,
    logger: &JobLogger,
) -> WorkerResult<JobOutcome> {
    ctx.tracker
        .start(task_id, if content_id.is_some() { 20 } else { 10 })
        .await?;
    logger.log_progress(&format!(
        "Synthesizing {} chars with {} ({}, {})",
        request.text.chars().count(),
        request.engine,
        request.language,
        request.voice
    ));

    let output = ctx.tts.generate(request, task_id.as_str()).await?;
    let audio_path = output.audio_path.to_string_lossy().to_string();

    if let Some(id) = content_id {
        ctx.content
            .record_artifact(
                id,
                GenerationSlot::Tts,
                task_id,
                Artifact {
                    path: audio_path.clone(),
                    duration: output.duration,
                    size: Some(output.file_size),
                },
            )
            .await?;
    }

    logger.log_completion(&format!("Audio written to {audio_path}"));
    Ok(JobOutcome::new(to_map(json!({
        "audio_path": audio_path,
        "file_size": output.file_size,
        "duration": output.duration,
        "generation_time": output.generation_time,
        "engine_used": output.engine_used,
        "content_id": content_id,
    }))))
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use ekos_models::{Content, ContentCreate, ContentStatus, ContentType, TaskStatus, TaskType};

    use super::*;
    use crate::jobs::testing::context;

    #[tokio::test]
    async fn test_standalone_tts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let task = ctx.tracker.create_task(TaskType::TtsGeneration, Map::new()).await.unwrap();
        let logger = JobLogger::new(&task.id, "tts_generation");

        let outcome = run(&ctx, &task.id, None, &TtsRequest::new("Привет, мир"), &logger)
            .await
            .unwrap();

        let path = outcome.result["audio_path"].as_str().unwrap();
        assert!(std::path::Path::new(path).is_file());
        assert_eq!(outcome.result["file_size"], 8);
        assert_eq!(outcome.result["content_id"], serde_json::Value::Null);
        assert_eq!(ctx.tracker.get_task(&task.id).await.unwrap().status, TaskStatus::Running);
    }

    #[tokio::test]
    async fn test_audio_content_becomes_ready() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let content = ctx
            .content
            .create(&Content::from_create(ContentCreate {
                content_type: ContentType::Audio,
                title: "Episode".to_string(),
                description: None,
                topic: String::new(),
                keywords: vec![],
                target_platforms: vec![],
                affiliate_links: vec![],
            }))
            .await
            .unwrap();
        let task = ctx.tracker.create_task(TaskType::TtsGeneration, Map::new()).await.unwrap();
        ctx.content
            .claim_slot(&content.id, GenerationSlot::Tts, &task.id, &ctx.tracker)
            .await
            .unwrap();
        let logger = JobLogger::new(&task.id, "tts_generation");

        run(&ctx, &task.id, Some(&content.id), &TtsRequest::new("Episode"), &logger)
            .await
            .unwrap();

        let stored = ctx.content.get(&content.id).await.unwrap();
        assert!(stored.audio_path.is_some());
        assert_eq!(stored.size, Some(8));
        assert_eq!(stored.status, ContentStatus::Ready);
    }

    #[tokio::test]
    async fn test_superseded_writer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let content = ctx
            .content
            .create(&Content::from_create(ContentCreate {
                content_type: ContentType::Video,
                title: "Clip".to_string(),
                description: None,
                topic: String::new(),
                keywords: vec![],
                target_platforms: vec![],
                affiliate_links: vec![],
            }))
            .await
            .unwrap();
        let stale = ctx.tracker.create_task(TaskType::TtsGeneration, Map::new()).await.unwrap();
        let logger = JobLogger::new(&stale.id, "tts_generation");

        let err = run(&ctx, &stale.id, Some(&content.id), &TtsRequest::new("Clip"), &logger)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(ctx.content.get(&content.id).await.unwrap().audio_path.is_none());
    }
}
