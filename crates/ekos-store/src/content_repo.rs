//! Content repository with single-writer artifact slots.
//!
//! A TTS or video job first claims the content's slot by recording its task
//! id. A claim is refused while the previously recorded task is still
//! active, and artifact paths are only accepted from the task currently
//! recorded in the slot.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use ekos_models::{Content, ContentId, ContentStatus, ContentType, GenerationSlot, TaskId};

use crate::document::DocumentStore;
use crate::error::{StoreError, StoreResult};
use crate::metrics::record_retry;
use crate::repos::{Repository, Versioned, MAX_UPDATE_RETRIES, RETRY_BASE_DELAY_MS};
use crate::tracker::TaskTracker;

/// Generated artifact written back onto a content record.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: String,
    pub duration: Option<f64>,
    pub size: Option<u64>,
}

/// Repository for content records.
#[derive(Clone)]
pub struct ContentRepository {
    repo: Repository<Content>,
}

impl ContentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn create(&self, content: &Content) -> StoreResult<Content> {
        let created = self.repo.create(content).await?;
        info!(content_id = %created.id, title = %created.title, "Content created");
        Ok(created)
    }

    pub async fn get(&self, id: &ContentId) -> StoreResult<Content> {
        self.repo.get(id.as_str()).await
    }

    /// Newest first.
    pub async fn list(&self, limit: usize) -> StoreResult<Vec<Content>> {
        let mut all = self.repo.list().await?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<Content>> {
        self.repo.list().await
    }

    pub async fn delete(&self, id: &ContentId) -> StoreResult<bool> {
        self.repo.delete(id.as_str()).await
    }

    /// Arbitrary optimistic update.
    pub async fn update<F>(&self, id: &ContentId, mutate: F) -> StoreResult<Content>
    where
        F: FnMut(&mut Content) -> StoreResult<()> + Send,
    {
        self.repo.update(id.as_str(), mutate).await
    }

    pub async fn set_generation_task(&self, id: &ContentId, task_id: &TaskId) -> StoreResult<Content> {
        self.update(id, |c| {
            c.generation_task_id = Some(task_id.clone());
            Ok(())
        })
        .await
    }

    /// Record `task_id` as the only writer of `slot`.
    ///
    /// Fails with `Conflict` if another task recorded in the slot is still
    /// pending, running or paused.
    pub async fn claim_slot(
        &self,
        id: &ContentId,
        slot: GenerationSlot,
        task_id: &TaskId,
        tracker: &TaskTracker,
    ) -> StoreResult<Content> {
        for attempt in 0..MAX_UPDATE_RETRIES {
            let mut content = self.repo.get(id.as_str()).await?;
            let version = content.version;

            if let Some(current) = content.slot_task(slot) {
                if current != task_id && tracker.is_active(current).await? {
                    return Err(StoreError::conflict(format!(
                        "{slot} generation already in progress for content {id} (task {current})"
                    )));
                }
            }

            content.set_slot_task(slot, task_id.clone());
            match self.repo.replace(&content, version).await {
                Ok(claimed) => {
                    debug!(content_id = %id, slot = %slot, task_id = %task_id, "Claimed generation slot");
                    return Ok(claimed);
                }
                Err(e) if e.is_precondition_failed() => {
                    record_retry(Content::COLLECTION);
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::conflict(format!(
            "content {id} could not be claimed due to concurrent writes"
        )))
    }

    /// Write an artifact path on behalf of `writer`.
    ///
    /// Fails with `Conflict` if a newer request has replaced `writer` in the
    /// slot; the record is left unchanged in that case.
    pub async fn record_artifact(
        &self,
        id: &ContentId,
        slot: GenerationSlot,
        writer: &TaskId,
        artifact: Artifact,
    ) -> StoreResult<Content> {
        let updated = self
            .update(id, |c| {
                if c.slot_task(slot) != Some(writer) {
                    return Err(StoreError::conflict(format!(
                        "task {writer} no longer owns the {slot} slot of content {id}"
                    )));
                }
                c.set_slot_path(slot, artifact.path.clone());

                let primary = match slot {
                    GenerationSlot::Video => true,
                    GenerationSlot::Tts => c.content_type == ContentType::Audio,
                };
                if primary {
                    c.duration = artifact.duration;
                    c.size = artifact.size;
                    if c.status == ContentStatus::Draft {
                        c.status = ContentStatus::Ready;
                    }
                }
                Ok(())
            })
            .await?;

        info!(content_id = %id, slot = %slot, path = %artifact.path, "Artifact recorded");
        Ok(updated)
    }

    /// Store a generated script, filling the title if it was blank.
    pub async fn set_script(
        &self,
        id: &ContentId,
        title: Option<&str>,
        script: &str,
    ) -> StoreResult<Content> {
        self.update(id, |c| {
            if let Some(t) = title {
                if c.title.trim().is_empty() {
                    c.title = t.to_string();
                }
            }
            c.script = Some(script.to_string());
            if c.status == ContentStatus::Draft {
                c.status = ContentStatus::Ready;
            }
            Ok(())
        })
        .await
    }

    pub async fn mark_published(&self, id: &ContentId) -> StoreResult<Content> {
        self.update(id, |c| {
            c.status = ContentStatus::Published;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use ekos_models::{ContentCreate, TaskType};
    use serde_json::Map;

    struct Fixture {
        repo: ContentRepository,
        tracker: TaskTracker,
        content: Content,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let repo = ContentRepository::new(store.clone());
        let tracker = TaskTracker::new(store);
        let content = repo
            .create(&Content::from_create(ContentCreate {
                content_type: ContentType::Video,
                title: "Crypto gifts".into(),
                description: None,
                topic: "crypto".into(),
                keywords: vec![],
                target_platforms: vec![],
                affiliate_links: vec![],
            }))
            .await
            .unwrap();
        Fixture {
            repo,
            tracker,
            content,
        }
    }

    #[tokio::test]
    async fn test_second_claim_rejected_while_first_active() {
        let f = fixture().await;
        let first = f
            .tracker
            .create_task(TaskType::TtsGeneration, Map::new())
            .await
            .unwrap();
        let second = f
            .tracker
            .create_task(TaskType::TtsGeneration, Map::new())
            .await
            .unwrap();

        f.repo
            .claim_slot(&f.content.id, GenerationSlot::Tts, &first.id, &f.tracker)
            .await
            .unwrap();
        let err = f
            .repo
            .claim_slot(&f.content.id, GenerationSlot::Tts, &second.id, &f.tracker)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // The video slot is independent
        f.repo
            .claim_slot(&f.content.id, GenerationSlot::Video, &second.id, &f.tracker)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_claim_allowed_after_first_finishes() {
        let f = fixture().await;
        let first = f
            .tracker
            .create_task(TaskType::TtsGeneration, Map::new())
            .await
            .unwrap();
        f.repo
            .claim_slot(&f.content.id, GenerationSlot::Tts, &first.id, &f.tracker)
            .await
            .unwrap();
        f.tracker.fail(&first.id, "engine down").await.unwrap();

        let second = f
            .tracker
            .create_task(TaskType::TtsGeneration, Map::new())
            .await
            .unwrap();
        let claimed = f
            .repo
            .claim_slot(&f.content.id, GenerationSlot::Tts, &second.id, &f.tracker)
            .await
            .unwrap();
        assert_eq!(claimed.tts_task_id.as_ref(), Some(&second.id));
    }

    #[tokio::test]
    async fn test_superseded_writer_cannot_record() {
        let f = fixture().await;
        let old = TaskId::new();
        let new = TaskId::new();
        f.repo
            .claim_slot(&f.content.id, GenerationSlot::Video, &old, &f.tracker)
            .await
            .unwrap();
        // `old` is not a stored task, so it counts as inactive
        f.repo
            .claim_slot(&f.content.id, GenerationSlot::Video, &new, &f.tracker)
            .await
            .unwrap();

        let artifact = Artifact {
            path: "old.mp4".into(),
            duration: Some(30.0),
            size: Some(1),
        };
        assert!(f
            .repo
            .record_artifact(&f.content.id, GenerationSlot::Video, &old, artifact.clone())
            .await
            .is_err());

        let updated = f
            .repo
            .record_artifact(
                &f.content.id,
                GenerationSlot::Video,
                &new,
                Artifact {
                    path: "new.mp4".into(),
                    ..artifact
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.video_path.as_deref(), Some("new.mp4"));
        assert_eq!(updated.status, ContentStatus::Ready);
        assert_eq!(updated.duration, Some(30.0));
    }

    #[tokio::test]
    async fn test_concurrent_claims_admit_one() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for _ in 0..3 {
            let repo = f.repo.clone();
            let tracker = f.tracker.clone();
            let content_id = f.content.id.clone();
            handles.push(tokio::spawn(async move {
                let task = tracker
                    .create_task(TaskType::VideoGeneration, Map::new())
                    .await
                    .unwrap();
                repo.claim_slot(&content_id, GenerationSlot::Video, &task.id, &tracker)
                    .await
                    .is_ok()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn test_set_script_fills_blank_title() {
        let f = fixture().await;
        let updated = f
            .repo
            .set_script(&f.content.id, Some("Other"), "Body")
            .await
            .unwrap();
        assert_eq!(updated.title, "Crypto gifts");
        assert_eq!(updated.script.as_deref(), Some("Body"));
        assert_eq!(updated.status, ContentStatus::Ready);
    }
}
