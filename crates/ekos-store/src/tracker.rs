//! Task tracker: persistent status records for background work.
//!
//! Every status change is written immediately through the optimistic
//! update loop, and transitions are checked against
//! [`TaskStatus::can_transition_to`] inside the loop so a stale writer can
//! never move a completed or failed task.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use ekos_models::{Task, TaskId, TaskStatus, TaskType};

use crate::document::DocumentStore;
use crate::error::{StoreError, StoreResult};
use crate::metrics::record_task_transition;
use crate::repos::Repository;

/// Persistent task status tracker.
#[derive(Clone)]
pub struct TaskTracker {
    repo: Repository<Task>,
}

impl TaskTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Create a pending task and return it.
    pub async fn create_task(
        &self,
        task_type: TaskType,
        parameters: Map<String, Value>,
    ) -> StoreResult<Task> {
        let task = self.repo.create(&Task::new(task_type, parameters)).await?;
        record_task_transition(task_type.as_str(), TaskStatus::Pending.as_str());
        info!(task_id = %task.id, task_type = %task_type, "Task created");
        Ok(task)
    }

    pub async fn get_task(&self, id: &TaskId) -> StoreResult<Task> {
        self.repo.get(id.as_str()).await
    }

    /// Newest first.
    pub async fn list_tasks(&self, limit: usize) -> StoreResult<Vec<Task>> {
        let mut tasks = self.repo.list().await?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        Ok(tasks)
    }

    /// Every stored task, unordered.
    pub async fn all_tasks(&self) -> StoreResult<Vec<Task>> {
        self.repo.list().await
    }

    /// Move a task to `status`, optionally raising progress. `error` is only
    /// recorded when moving to `Failed`.
    ///
    /// Fails with `InvalidTransition` if the move is not allowed; the record
    /// is left unchanged in that case.
    pub async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        progress: Option<u8>,
        error: Option<String>,
    ) -> StoreResult<Task> {
        let task = self
            .repo
            .update(id.as_str(), |task| {
                task.transition(status)?;
                if let Some(p) = progress {
                    if !task.is_terminal() {
                        task.set_progress(p)?;
                    }
                }
                if status == TaskStatus::Failed {
                    if let Some(msg) = &error {
                        task.error_message = Some(msg.clone());
                    }
                }
                Ok(())
            })
            .await?;

        record_task_transition(task.task_type.as_str(), status.as_str());
        debug!(task_id = %id, status = %status, progress = task.progress, "Task status updated");
        Ok(task)
    }

    /// Mark a task running.
    pub async fn start(&self, id: &TaskId, progress: u8) -> StoreResult<Task> {
        self.update_status(id, TaskStatus::Running, Some(progress), None)
            .await
    }

    /// Raise the progress of a running or paused task.
    pub async fn set_progress(&self, id: &TaskId, progress: u8) -> StoreResult<Task> {
        self.repo
            .update(id.as_str(), |task| Ok(task.set_progress(progress)?))
            .await
    }

    /// Append a log line.
    pub async fn append_log(&self, id: &TaskId, message: impl Into<String>) -> StoreResult<Task> {
        let message = message.into();
        self.repo
            .update(id.as_str(), |task| {
                task.log(&message);
                Ok(())
            })
            .await
    }

    /// Mark a task completed with its result payload.
    pub async fn complete(&self, id: &TaskId, result: Map<String, Value>) -> StoreResult<Task> {
        let task = self
            .repo
            .update(id.as_str(), |task| Ok(task.complete(result.clone())?))
            .await?;
        record_task_transition(task.task_type.as_str(), TaskStatus::Completed.as_str());
        info!(task_id = %id, task_type = %task.task_type, "Task completed");
        Ok(task)
    }

    /// Mark a task failed with an error message.
    pub async fn fail(&self, id: &TaskId, error: impl Into<String>) -> StoreResult<Task> {
        let error = error.into();
        let task = self
            .repo
            .update(id.as_str(), |task| Ok(task.fail(error.clone())?))
            .await?;
        record_task_transition(task.task_type.as_str(), TaskStatus::Failed.as_str());
        info!(task_id = %id, task_type = %task.task_type, error = %error, "Task failed");
        Ok(task)
    }

    pub async fn pause(&self, id: &TaskId) -> StoreResult<Task> {
        self.update_status(id, TaskStatus::Paused, None, None).await
    }

    /// Remove a task record. Returns false if it did not exist.
    pub async fn delete_task(&self, id: &TaskId) -> StoreResult<bool> {
        self.repo.delete(id.as_str()).await
    }

    /// Fail every pending, running or paused task with `reason`.
    ///
    /// Run once at startup: jobs live in process memory, so no earlier task
    /// can still finish, and leaving it active would hold its generation slot.
    /// Returns the number of tasks failed.
    pub async fn fail_unfinished(&self, reason: &str) -> StoreResult<usize> {
        let mut failed = 0;
        for task in self.repo.list().await? {
            if !task.status.is_active() {
                continue;
            }
            match self.fail(&task.id, reason).await {
                Ok(_) => failed += 1,
                // Finished or removed since the listing
                Err(StoreError::InvalidTransition(_)) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(failed)
    }

    /// True if the task exists and has not finished.
    pub async fn is_active(&self, id: &TaskId) -> StoreResult<bool> {
        Ok(self
            .repo
            .find(id.as_str())
            .await?
            .map(|t| t.status.is_active())
            .unwrap_or(false))
    }
}
