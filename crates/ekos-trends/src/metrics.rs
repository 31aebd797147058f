//! Trend collection metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Feed fetches by source and outcome.
    pub const FEED_FETCHES_TOTAL: &str = "trend_feed_fetches_total";

    /// Trends kept per collection run.
    pub const TRENDS_COLLECTED: &str = "trends_collected";
}

pub fn record_feed_fetch(source: &str, ok: bool) {
    counter!(
        names::FEED_FETCHES_TOTAL,
        "source" => source.to_string(),
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

pub fn record_trends_collected(count: usize) {
    histogram!(names::TRENDS_COLLECTED).record(count as f64);
}
