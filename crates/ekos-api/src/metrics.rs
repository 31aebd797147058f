//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "ekos_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ekos_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ekos_http_requests_in_flight";

    // Job metrics
    pub const JOBS_SUBMITTED_TOTAL: &str = "ekos_jobs_submitted_total";
    pub const GENERATION_CONFLICTS_TOTAL: &str = "ekos_generation_conflicts_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "ekos_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a job handed to the executor.
pub fn record_job_submitted(job_type: &str) {
    let labels = [("type", job_type.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

/// Record a generation request refused because another task holds the slot.
pub fn record_generation_conflict(slot: &str) {
    let labels = [("slot", slot.to_string())];
    counter!(names::GENERATION_CONFLICTS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").unwrap());

/// Sanitize path for metrics labels (remove IDs).
fn sanitize_path(path: &str) -> String {
    let path = UUID_RE.replace_all(path, ":id");
    NUMERIC_RE.replace_all(&path, "/:id$1").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/content/550e8400-e29b-41d4-a716-446655440000/generate_tts"),
            "/api/content/:id/generate_tts"
        );
        assert_eq!(sanitize_path("/api/tasks/42"), "/api/tasks/:id");
        assert_eq!(sanitize_path("/api/trends/popular"), "/api/trends/popular");
    }
}
