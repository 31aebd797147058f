//! Job execution metrics.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Finished jobs by type and outcome.
    pub const JOBS_TOTAL: &str = "jobs_total";

    /// Job wall time in seconds by type.
    pub const JOB_DURATION_SECONDS: &str = "job_duration_seconds";

    /// Jobs currently holding an executor slot.
    pub const JOBS_IN_FLIGHT: &str = "jobs_in_flight";

    /// Publication attempts by platform and outcome.
    pub const PUBLICATIONS_TOTAL: &str = "publications_total";
}

pub fn record_job(job_type: &str, ok: bool, seconds: f64) {
    counter!(
        names::JOBS_TOTAL,
        "job_type" => job_type.to_string(),
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "job_type" => job_type.to_string()).record(seconds);
}

pub fn job_started() {
    gauge!(names::JOBS_IN_FLIGHT).increment(1.0);
}

pub fn job_finished() {
    gauge!(names::JOBS_IN_FLIGHT).decrement(1.0);
}

pub fn record_publication(platform: &str, ok: bool) {
    counter!(
        names::PUBLICATIONS_TOTAL,
        "platform" => platform.to_string(),
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}
