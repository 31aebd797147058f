//! Structured job logging utilities.
//!
//! Every line carries the task id and operation so one job can be followed
//! through interleaved executor output.

use tracing::{error, info, warn, Span};

use ekos_models::TaskId;

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    task_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a task and operation.
    pub fn new(task_id: &TaskId, operation: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span to instrument the job future with.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            task_id = %self.task_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let task_id = TaskId::new();
        let logger = JobLogger::new(&task_id, "tts_generation");

        assert_eq!(logger.task_id(), task_id.to_string());
        assert_eq!(logger.operation(), "tts_generation");
    }
}
