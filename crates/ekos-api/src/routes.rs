//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::analytics::get_analytics;
use crate::handlers::content::{
    create_content, generate_content_legacy, generate_content_tts, generate_content_video, get_content,
    list_content, publish_content,
};
use crate::handlers::dashboard::dashboard;
use crate::handlers::publications::{get_publication, list_publications};
use crate::handlers::settings::{get_settings, update_settings};
use crate::handlers::tasks::{create_task, create_task_legacy, delete_task, get_task, list_tasks, pause_task};
use crate::handlers::trends::{create_content_from_trend, list_trends, monitor_trends, popular_trends};
use crate::handlers::tts::{generate_tts, tts_info};
use crate::handlers::video::{generate_video, video_info};
use crate::handlers::{health, ready, root};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let task_routes = Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/create", post(create_task_legacy))
        .route("/tasks/:task_id", get(get_task).delete(delete_task))
        .route("/tasks/:task_id/pause", post(pause_task));

    let content_routes = Router::new()
        .route("/content", post(create_content).get(list_content))
        .route("/content/generate", post(generate_content_legacy))
        .route("/content/:content_id", get(get_content))
        // Generation requests are refused with 409 while one is active
        .route("/content/:content_id/generate_tts", post(generate_content_tts))
        .route("/content/:content_id/generate_video", post(generate_content_video))
        .route("/content/:content_id/publish", post(publish_content));

    let media_routes = Router::new()
        .route("/tts/info", get(tts_info))
        .route("/tts/generate", post(generate_tts))
        .route("/video/info", get(video_info))
        .route("/video/generate", post(generate_video));

    let trend_routes = Router::new()
        .route("/trends", get(list_trends))
        .route("/trends/popular", get(popular_trends))
        .route("/trends/monitor", post(monitor_trends))
        .route("/trends/:trend_id/create_content", post(create_content_from_trend));

    let report_routes = Router::new()
        .route("/publications", get(list_publications))
        .route("/publications/:publication_id", get(get_publication))
        .route("/analytics", get(get_analytics))
        .route("/dashboard", get(dashboard));

    let settings_routes = Router::new()
        .route("/settings", get(get_settings).post(update_settings));

    let rate_limiter = RateLimiterCache::new(state.config.rate_limit_rps, state.config.rate_limit_burst);

    let api_routes = Router::new()
        .route("/", get(root))
        .merge(task_routes)
        .merge(content_routes)
        .merge(media_routes)
        .merge(trend_routes)
        .merge(report_routes)
        .merge(settings_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
