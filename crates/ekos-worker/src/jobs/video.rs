//! Video rendering job.

use std::path::PathBuf;

use serde_json::json;
use tokio::sync::watch;

use ekos_media::{ProgressCallback, VideoRequest};
use ekos_models::{GenerationSlot, TaskId, VideoParams};
use ekos_store::Artifact;

use super::{to_map, JobContext, JobOutcome, VideoSource};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Task progress while FFmpeg runs is mapped into this range.
const RENDER_PROGRESS_START: u8 = 10;
const RENDER_PROGRESS_END: u8 = 90;

pub(super) async fn run(
    ctx: &JobContext,
    task_id: &TaskId,
    source: &VideoSource,
    params: &VideoParams,
    logger: &JobLogger,
) -> WorkerResult<JobOutcome> {
    ctx.tracker.start(task_id, RENDER_PROGRESS_START).await?;

    let (request, content_id) = match source {
        VideoSource::Content(id) => {
            let content = ctx.content.get(id).await?;
            let text = content
                .narration_text()
                .ok_or_else(|| WorkerError::job_failed("content has no text to render"))?
                .to_string();
            let request = VideoRequest {
                title: content.title.clone(),
                text,
                params: params.clone(),
                audio_path: content.audio_path.as_deref().map(PathBuf::from),
            };
            (request, Some(id.clone()))
        }
        VideoSource::Text {
            title,
            text,
            audio_path,
        } => (
            VideoRequest {
                title: title.clone(),
                text: text.clone(),
                params: params.clone(),
                audio_path: audio_path.clone(),
            },
            None,
        ),
    };

    if params.include_audio && request.audio_path.is_none() {
        logger.log_warning("Audio requested but no narration is available");
    }
    logger.log_progress(&format!(
        "Rendering {} {} at {} for {}s",
        params.video_type.as_str(),
        params.style,
        params.resolution,
        params.duration
    ));

    let (progress_tx, progress_rx) = watch::channel(RENDER_PROGRESS_START);
    let forwarder = tokio::spawn(forward_progress(ctx.clone(), task_id.clone(), progress_rx));
    let total_ms = i64::from(params.duration) * 1000;
    let callback: ProgressCallback = Box::new(move |p| {
        let span = f64::from(RENDER_PROGRESS_END - RENDER_PROGRESS_START);
        let value = RENDER_PROGRESS_START as f64 + p.percentage(total_ms) / 100.0 * span;
        progress_tx.send_replace(value.round().min(RENDER_PROGRESS_END as f64) as u8);
    });

    let result = ctx.video.generate(&request, task_id.as_str(), Some(callback)).await;
    // The callback owned the sender; the forwarder stops once it is dropped.
    let _ = forwarder.await;
    let output = result?;

    let video_path = output.video_path.to_string_lossy().to_string();
    if let Some(id) = &content_id {
        ctx.content
            .record_artifact(
                id,
                GenerationSlot::Video,
                task_id,
                Artifact {
                    path: video_path.clone(),
                    duration: Some(output.duration),
                    size: Some(output.file_size),
                },
            )
            .await?;
    }

    logger.log_completion(&format!("Video written to {video_path}"));
    Ok(JobOutcome::new(to_map(json!({
        "video_path": video_path,
        "duration": output.duration,
        "file_size": output.file_size,
        "generation_time": output.generation_time,
        "has_audio": output.has_audio,
        "resolution": output.resolution,
        "style": output.style,
        "content_id": content_id,
    }))))
}

/// Write render progress to the task until the sender is dropped.
async fn forward_progress(ctx: JobContext, task_id: TaskId, mut rx: watch::Receiver<u8>) {
    let mut last = RENDER_PROGRESS_START;
    while rx.changed().await.is_ok() {
        let value = *rx.borrow_and_update();
        if value <= last {
            continue;
        }
        last = value;
        if let Err(e) = ctx.tracker.set_progress(&task_id, value).await {
            tracing::debug!(task_id = %task_id, error = %e, "Progress update skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use ekos_models::{Content, ContentCreate, ContentStatus, ContentType, TaskType};

    use super::*;
    use crate::jobs::testing::context;

    #[tokio::test]
    async fn test_content_video_with_narration() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let audio = dir.path().join("narration.mp3");
        std::fs::write(&audio, b"mp3").unwrap();

        let mut draft = Content::from_create(ContentCreate {
            content_type: ContentType::Video,
            title: "Gifts".to_string(),
            description: None,
            topic: String::new(),
            keywords: vec![],
            target_platforms: vec![],
            affiliate_links: vec![],
        });
        draft.script = Some("First sentence. Second sentence.".to_string());
        draft.audio_path = Some(audio.to_string_lossy().to_string());
        let content = ctx.content.create(&draft).await.unwrap();

        let task = ctx.tracker.create_task(TaskType::VideoGeneration, Map::new()).await.unwrap();
        ctx.content
            .claim_slot(&content.id, GenerationSlot::Video, &task.id, &ctx.tracker)
            .await
            .unwrap();
        let logger = JobLogger::new(&task.id, "video_generation");
        let params = VideoParams {
            duration: 5,
            ..VideoParams::default()
        };

        let outcome = run(&ctx, &task.id, &VideoSource::Content(content.id.clone()), &params, &logger)
            .await
            .unwrap();

        assert_eq!(outcome.result["has_audio"], true);
        // Narration outlasts the requested duration.
        assert_eq!(outcome.result["duration"], 12.0);

        let stored = ctx.content.get(&content.id).await.unwrap();
        assert_eq!(stored.video_path.as_deref(), outcome.result["video_path"].as_str());
        assert_eq!(stored.duration, Some(12.0));
        assert_eq!(stored.status, ContentStatus::Ready);
        assert!(ctx.tracker.get_task(&task.id).await.unwrap().progress >= RENDER_PROGRESS_START);
    }

    #[tokio::test]
    async fn test_free_text_video() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let task = ctx.tracker.create_task(TaskType::VideoGeneration, Map::new()).await.unwrap();
        let logger = JobLogger::new(&task.id, "video_generation");
        let source = VideoSource::Text {
            title: "Hello".to_string(),
            text: "Just text.".to_string(),
            audio_path: None,
        };

        let outcome = run(&ctx, &task.id, &source, &VideoParams::default(), &logger)
            .await
            .unwrap();

        assert_eq!(outcome.result["has_audio"], false);
        assert_eq!(outcome.result["duration"], 30.0);
        assert_eq!(outcome.result["content_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_missing_content_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), vec![]);
        let task = ctx.tracker.create_task(TaskType::VideoGeneration, Map::new()).await.unwrap();
        let logger = JobLogger::new(&task.id, "video_generation");

        let err = run(
            &ctx,
            &task.id,
            &VideoSource::Content(ekos_models::ContentId::new()),
            &VideoParams::default(),
            &logger,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkerError::Store(e) if e.is_not_found()));
    }
}
