//! Task records tracking long-running generation steps.
//!
//! Every background step (trend monitoring, content generation, TTS, video,
//! publishing) is represented by a [`Task`] whose status only moves forward:
//!
//! ```text
//! pending ──► running ──► completed
//!    │  ╲        │  ▲
//!    │   ╲       ▼  │
//!    │    ──► paused ──► completed / failed
//!    ▼
//! failed
//! ```

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::TaskId;

/// Maximum number of log lines kept on a task record.
pub const MAX_TASK_LOGS: usize = 200;

/// Kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    TrendMonitoring,
    ContentGeneration,
    Publishing,
    Analytics,
    VideoGeneration,
    TtsGeneration,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::TrendMonitoring => "trend_monitoring",
            TaskType::ContentGeneration => "content_generation",
            TaskType::Publishing => "publishing",
            TaskType::Analytics => "analytics",
            TaskType::VideoGeneration => "video_generation",
            TaskType::TtsGeneration => "tts_generation",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, waiting for the executor
    #[default]
    Pending,
    /// Being processed
    Running,
    /// Halted by an operator
    Paused,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Completed and failed tasks never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Pending, running or paused.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether a task in this status may move to `next`.
    ///
    /// `running -> running` is allowed so progress updates can be written.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running | Paused | Failed)
                | (Running, Running | Paused | Completed | Failed)
                | (Paused, Running | Completed | Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid task transition from {from} to {to}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Request body for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskCreate {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A tracked unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub id: TaskId,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    #[serde(default)]
    pub status: TaskStatus,

    /// Progress percentage (0-100)
    #[serde(default)]
    pub progress: u8,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default)]
    pub logs: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,

    /// Store version, bumped on every write.
    #[serde(default)]
    pub version: u64,
}

impl Task {
    /// Create a pending task.
    pub fn new(task_type: TaskType, parameters: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            task_type,
            status: TaskStatus::Pending,
            progress: 0,
            parameters,
            result: None,
            error_message: None,
            logs: Vec::new(),
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            estimated_completion: None,
            version: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`, stamping the lifecycle timestamps.
    ///
    /// Same-status updates for pending and paused tasks are no-ops.
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), TransitionError> {
        if next == self.status && matches!(next, TaskStatus::Pending | TaskStatus::Paused) {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        if next == TaskStatus::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        if next == TaskStatus::Completed {
            self.progress = 100;
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Raise progress. Lower values are ignored so progress never goes back.
    pub fn set_progress(&mut self, progress: u8) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: self.status,
            });
        }
        self.progress = self.progress.max(progress.min(100));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark completed with a result payload.
    pub fn complete(&mut self, result: Map<String, Value>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    /// Mark failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Failed)?;
        self.error_message = Some(error.into());
        Ok(())
    }

    /// Append a timestamped log line, dropping the oldest past [`MAX_TASK_LOGS`].
    pub fn log(&mut self, message: impl AsRef<str>) {
        let now = Utc::now();
        self.logs
            .push(format!("[{}] {}", now.format("%H:%M:%S"), message.as_ref()));
        if self.logs.len() > MAX_TASK_LOGS {
            let excess = self.logs.len() - MAX_TASK_LOGS;
            self.logs.drain(..excess);
        }
        self.updated_at = now;
    }

    /// Human-readable status line for polling clients.
    pub fn status_message(&self) -> String {
        match self.status {
            TaskStatus::Pending => "Task is waiting to start".to_string(),
            TaskStatus::Running => format!("Task is running ({}%)", self.progress),
            TaskStatus::Paused => "Task is paused".to_string(),
            TaskStatus::Completed => "Task completed successfully".to_string(),
            TaskStatus::Failed => format!(
                "Task failed: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    /// Read a string parameter.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Paused,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [TaskStatus::Completed, TaskStatus::Failed] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_pending_is_never_reentered() {
        for from in ALL {
            assert!(!from.can_transition_to(TaskStatus::Pending));
        }
    }

    #[test]
    fn test_lifecycle_stamps_timestamps() {
        let mut task = Task::new(TaskType::TtsGeneration, Map::new());
        task.transition(TaskStatus::Running).unwrap();
        assert!(task.started_at.is_some());
        task.set_progress(40).unwrap();

        let mut result = Map::new();
        result.insert("audio_path".into(), Value::from("out.wav"));
        task.complete(result).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.completed_at.is_some());
        assert_eq!(
            task.result.as_ref().and_then(|r| r.get("audio_path")),
            Some(&Value::from("out.wav"))
        );
    }

    #[test]
    fn test_completed_task_rejects_fail() {
        let mut task = Task::new(TaskType::Publishing, Map::new());
        task.transition(TaskStatus::Running).unwrap();
        task.complete(Map::new()).unwrap();

        let err = task.fail("late error").unwrap_err();
        assert_eq!(err.from, TaskStatus::Completed);
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.error_message.is_none());
        assert!(task.set_progress(10).is_err());
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut task = Task::new(TaskType::VideoGeneration, Map::new());
        task.transition(TaskStatus::Running).unwrap();
        task.set_progress(60).unwrap();
        task.set_progress(20).unwrap();
        assert_eq!(task.progress, 60);
        task.set_progress(250).unwrap();
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut task = Task::new(TaskType::ContentGeneration, Map::new());
        task.transition(TaskStatus::Paused).unwrap();
        task.transition(TaskStatus::Paused).unwrap();
        task.transition(TaskStatus::Running).unwrap();
        assert_eq!(task.status, TaskStatus::Running);
    }

    #[test]
    fn test_logs_are_capped() {
        let mut task = Task::new(TaskType::Analytics, Map::new());
        for i in 0..(MAX_TASK_LOGS + 5) {
            task.log(format!("line {i}"));
        }
        assert_eq!(task.logs.len(), MAX_TASK_LOGS);
        assert!(task.logs[0].ends_with("line 5"));
    }

    #[test]
    fn test_task_create_uses_type_key() {
        let req: TaskCreate =
            serde_json::from_str(r#"{"type":"tts_generation","parameters":{"text":"hi"}}"#)
                .unwrap();
        assert_eq!(req.task_type, TaskType::TtsGeneration);
        assert_eq!(req.parameters.get("text"), Some(&Value::from("hi")));
    }
}
