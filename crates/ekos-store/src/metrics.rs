//! Store metrics collection.
//!
//! Provides standardized metrics for monitoring store operations:
//! - Operation counters by collection, operation and outcome
//! - Latency histograms
//! - Optimistic-lock retry counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total store operations by collection, operation and outcome.
    pub const OPERATIONS_TOTAL: &str = "store_operations_total";

    /// Total version-conflict retries by collection.
    pub const RETRIES_TOTAL: &str = "store_retries_total";

    /// Operation latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "store_latency_seconds";

    /// Task status transitions by task type and new status.
    pub const TASK_TRANSITIONS_TOTAL: &str = "task_transitions_total";
}

/// Record metrics for a completed store operation.
pub fn record_operation(collection: &str, operation: &str, ok: bool, latency_ms: f64) {
    counter!(
        names::OPERATIONS_TOTAL,
        "collection" => collection.to_string(),
        "operation" => operation.to_string(),
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a version-conflict retry.
pub fn record_retry(collection: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "collection" => collection.to_string()
    )
    .increment(1);
}

/// Record a task status transition.
pub fn record_task_transition(task_type: &str, status: &str) {
    counter!(
        names::TASK_TRANSITIONS_TOTAL,
        "task_type" => task_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::OPERATIONS_TOTAL.contains("operations"));
        assert!(names::RETRIES_TOTAL.contains("retries"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
    }
}
