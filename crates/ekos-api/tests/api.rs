//! Router-level tests over an in-memory store and fake engines.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ekos_api::{create_router, ApiConfig, AppState};
use ekos_media::{MediaResult, ProgressCallback, RenderPlan, TtsEngine, TtsService, VideoGenerator, VideoRenderer};
use ekos_models::{
    Content, ContentId, GenerationSlot, Platform, TaskId, TaskType, Trend, TtsEngineKind, TtsRequest, TtsVoice,
};
use ekos_store::{DocumentStore, MemoryStore};
use ekos_trends::{TemplateGenerator, TrendProvider};
use ekos_worker::{JobContext, JobExecutor, Publisher, PublisherRegistry, WorkerConfig, WorkerResult};

struct FakeTts;

#[async_trait]
impl TtsEngine for FakeTts {
    fn kind(&self) -> TtsEngineKind {
        TtsEngineKind::Gtts
    }

    fn voices(&self) -> &'static [TtsVoice] {
        &[TtsVoice::Female]
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn synthesize(&self, _request: &TtsRequest, output: &Path) -> MediaResult<()> {
        tokio::fs::write(output, b"ID3audio").await?;
        Ok(())
    }
}

struct FakeRenderer;

#[async_trait]
impl VideoRenderer for FakeRenderer {
    fn is_available(&self) -> bool {
        true
    }

    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(5.0)
    }

    async fn render(&self, _plan: &RenderPlan, output: &Path, _progress: Option<ProgressCallback>) -> MediaResult<()> {
        tokio::fs::write(output, b"mp4video").await?;
        Ok(())
    }
}

struct NoTrends;

#[async_trait]
impl TrendProvider for NoTrends {
    async fn collect(&self, _keywords: &[String]) -> Vec<Trend> {
        Vec::new()
    }
}

struct FakeTelegram;

#[async_trait]
impl Publisher for FakeTelegram {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn publish(&self, _content: &Content) -> WorkerResult<String> {
        Ok("42".to_string())
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    dir: TempDir,
}

fn test_app() -> TestApp {
    test_app_on(Arc::new(MemoryStore::new()))
}

/// App over an existing store, as after a restart.
fn test_app_on(store: Arc<dyn DocumentStore>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let ctx = JobContext::new(
        store.clone(),
        TtsService::new(dir.path().join("audio")).with_engine(Arc::new(FakeTts)),
        VideoGenerator::new(Arc::new(FakeRenderer), dir.path().join("video")),
        Arc::new(NoTrends),
        Arc::new(TemplateGenerator::new()),
        PublisherRegistry::new().with_publisher(Arc::new(FakeTelegram)),
    );
    let executor = JobExecutor::new(WorkerConfig::default(), ctx);
    let state = AppState::new(ApiConfig::default(), store, executor);

    TestApp {
        router: create_router(state.clone(), None),
        state,
        dir,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Poll a task until it completes or fails.
    async fn finished_task(&self, task_id: &str) -> Value {
        for _ in 0..300 {
            let (_, task) = self.get(&format!("/api/tasks/{task_id}")).await;
            if matches!(task["status"].as_str(), Some("completed" | "failed")) {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} did not finish");
    }
}

#[tokio::test]
async fn test_health_and_banner() {
    let app = test_app();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/api").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().starts_with("EKOSYSTEMA_FULL API v"));

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"]["status"], "ok");
}

#[tokio::test]
async fn test_trend_monitoring_task_completes() {
    let app = test_app();

    let (status, body) = app.post("/api/tasks", json!({"type": "trend_monitoring"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let task = app.finished_task(body["task_id"].as_str().unwrap()).await;
    assert_eq!(task["status"], "completed");
    assert_eq!(task["progress"], 100);
    assert_eq!(task["result"]["trends_found"], 0);
}

#[tokio::test]
async fn test_unknown_task_is_404() {
    let app = test_app();

    let (status, body) = app.get("/api/tasks/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());

    let (status, _) = app.send(Method::DELETE, "/api/tasks/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_legacy_task_with_unknown_type_is_rejected() {
    let app = test_app();

    let (status, _) = app.post("/api/tasks/create", json!({"type": "mining"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/api/tasks/create", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let task = app
        .state
        .tracker
        .get_task(&TaskId::from_string(body["task_id"].as_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(task.task_type, TaskType::ContentGeneration);
}

#[tokio::test]
async fn test_pause_rules() {
    let app = test_app();

    // Without parameters an analytics task has nothing to run and stays pending
    let (_, body) = app.post("/api/tasks", json!({"type": "analytics"})).await;
    let pending = body["task_id"].as_str().unwrap().to_string();
    let (status, _) = app.post(&format!("/api/tasks/{pending}/pause"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, task) = app.get(&format!("/api/tasks/{pending}")).await;
    assert_eq!(task["status"], "paused");

    let (_, body) = app.post("/api/tts/generate", json!({"text": "Привет, мир"})).await;
    let done = body["task_id"].as_str().unwrap().to_string();
    assert_eq!(app.finished_task(&done).await["status"], "completed");

    let (status, _) = app.post(&format!("/api/tasks/{done}/pause"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, task) = app.get(&format!("/api/tasks/{done}")).await;
    assert_eq!(task["status"], "completed");
}

#[tokio::test]
async fn test_tts_requires_text() {
    let app = test_app();

    let (status, body) = app.post("/api/tts/generate", json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = app
        .post("/api/tts/generate", json!({"text": "Привет", "speed": 5.0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/video/generate", json!({"text": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_content_gets_a_script() {
    let app = test_app();

    let (status, body) = app
        .post(
            "/api/content",
            json!({"type": "video", "title": "Подарки в Telegram", "topic": "telegram"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let content_id = body["content_id"].as_str().unwrap().to_string();
    let task = app.finished_task(body["task_id"].as_str().unwrap()).await;
    assert_eq!(task["status"], "completed");

    let (status, content) = app.get(&format!("/api/content/{content_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["status"], "ready");
    assert!(!content["script"].as_str().unwrap().is_empty());

    let (_, list) = app.get("/api/content").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_second_generation_request_is_refused() {
    let app = test_app();

    let (_, body) = app
        .post("/api/content/generate", json!({"topic": "подарки", "description": "Бесплатные подарки"}))
        .await;
    let content_id = ContentId::from_string(body["content_id"].as_str().unwrap());
    app.finished_task(body["task_id"].as_str().unwrap()).await;

    // A pending task already owns the speech slot
    let holder = app
        .state
        .tracker
        .create_task(TaskType::TtsGeneration, Default::default())
        .await
        .unwrap();
    app.state
        .content
        .claim_slot(&content_id, GenerationSlot::Tts, &holder.id, &app.state.tracker)
        .await
        .unwrap();
    let tasks_before = app.state.tracker.all_tasks().await.unwrap().len();

    let (status, body) = app
        .post(&format!("/api/content/{content_id}/generate_tts"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("already in progress"));
    assert_eq!(app.state.tracker.all_tasks().await.unwrap().len(), tasks_before);

    // The video slot is independent
    let (status, body) = app
        .post(&format!("/api/content/{content_id}/generate_video"), json!({"duration": 5}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.finished_task(body["task_id"].as_str().unwrap()).await["status"], "completed");

    let content = app.state.content.get(&content_id).await.unwrap();
    assert!(content.video_path.is_some());
    assert!(content.audio_path.is_none());
}

#[tokio::test]
async fn test_publishing_records_a_publication() {
    let app = test_app();

    let (_, body) = app
        .post("/api/content", json!({"title": "Боты", "target_platforms": ["telegram"]}))
        .await;
    let content_id = body["content_id"].as_str().unwrap().to_string();
    app.finished_task(body["task_id"].as_str().unwrap()).await;

    let (status, body) = app.post(&format!("/api/content/{content_id}/publish"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.finished_task(body["task_id"].as_str().unwrap()).await["status"], "completed");

    let (_, publications) = app.get(&format!("/api/publications?content_id={content_id}")).await;
    let publications = publications.as_array().unwrap();
    assert_eq!(publications.len(), 1);
    assert_eq!(publications[0]["status"], "published");
    assert_eq!(publications[0]["platform_post_id"], "42");

    let (_, content) = app.get(&format!("/api/content/{content_id}")).await;
    assert_eq!(content["status"], "published");
}

#[tokio::test]
async fn test_settings_keys_are_masked() {
    let app = test_app();

    let (status, _) = app
        .post("/api/settings", json!({"api_keys": {"telegram_bot_token": "123456789"}}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = app.get("/api/settings").await;
    assert_eq!(settings["api_keys"]["telegram_bot_token"], "****6789");

    // Posting the masked value back keeps the stored key
    let (status, _) = app.post("/api/settings", settings).await;
    assert_eq!(status, StatusCode::OK);
    let stored = app.state.settings.get().await.unwrap();
    assert_eq!(stored.api_keys["telegram_bot_token"], "123456789");
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = test_app();

    app.post("/api/tasks", json!({"type": "analytics"})).await;
    let (_, body) = app.post("/api/content", json!({"title": "Крипта"})).await;
    app.finished_task(body["task_id"].as_str().unwrap()).await;

    let (status, dashboard) = app.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stats"]["total_content"], 1);
    assert_eq!(dashboard["stats"]["pending_tasks"], 1);
    assert_eq!(dashboard["stats"]["system_status"], "active");
    assert_eq!(dashboard["tasks_by_status"]["completed"], 1);
    assert_eq!(dashboard["recent_tasks"].as_array().unwrap().len(), 2);
}

/// Content with a finished script, ready for TTS and video requests.
async fn scripted_content(app: &TestApp) -> ContentId {
    let (_, body) = app
        .post("/api/content/generate", json!({"topic": "подарки", "description": "Бесплатные подарки"}))
        .await;
    app.finished_task(body["task_id"].as_str().unwrap()).await;
    ContentId::from_string(body["content_id"].as_str().unwrap())
}

#[tokio::test]
async fn test_restart_releases_generation_slots() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let before = test_app_on(store.clone());
    let content_id = scripted_content(&before).await;

    // A job that was running when the process went away
    let orphan = before
        .state
        .tracker
        .create_task(TaskType::TtsGeneration, Default::default())
        .await
        .unwrap();
    before.state.tracker.start(&orphan.id, 30).await.unwrap();
    before
        .state
        .content
        .claim_slot(&content_id, GenerationSlot::Tts, &orphan.id, &before.state.tracker)
        .await
        .unwrap();
    drop(before);

    let after = test_app_on(store);
    let uri = format!("/api/content/{content_id}/generate_tts");
    let (status, _) = after.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(after.state.fail_interrupted_tasks().await.unwrap(), 1);
    let (_, task) = after.get(&format!("/api/tasks/{}", orphan.id)).await;
    assert_eq!(task["status"], "failed");
    assert_eq!(task["error_message"], ekos_api::state::INTERRUPTED_MESSAGE);

    let (status, body) = after.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after.finished_task(body["task_id"].as_str().unwrap()).await["status"], "completed");
    assert!(after.state.content.get(&content_id).await.unwrap().audio_path.is_some());
}

#[tokio::test]
async fn test_refused_job_fails_task_and_frees_slot() {
    let app = test_app();
    let content_id = scripted_content(&app).await;
    app.state.executor.shutdown().await;

    let uri = format!("/api/content/{content_id}/generate_tts");
    let (status, _) = app.post(&uri, json!({})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let content = app.state.content.get(&content_id).await.unwrap();
    let claimed = content.tts_task_id.expect("slot claimed before submit");
    let task = app.state.tracker.get_task(&claimed).await.unwrap();
    assert_eq!(task.status, ekos_models::TaskStatus::Failed);
    assert!(!app.state.tracker.is_active(&claimed).await.unwrap());

    // Standalone tasks are not left pending either
    let (status, _) = app.post("/api/tasks", json!({"type": "trend_monitoring"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let tasks = app.state.tracker.all_tasks().await.unwrap();
    assert!(tasks.iter().all(|t| !t.status.is_active()));
}

#[tokio::test]
async fn test_video_audio_must_live_in_audio_dir() {
    let app = test_app();
    let audio_dir = app.state.tts.audio_dir().to_path_buf();
    tokio::fs::create_dir_all(&audio_dir).await.unwrap();
    let inside = audio_dir.join("tts_voice.mp3");
    tokio::fs::write(&inside, b"ID3audio").await.unwrap();
    let outside = app.dir.path().join("secret.mp3");
    tokio::fs::write(&outside, b"ID3audio").await.unwrap();

    let escape = audio_dir.join("..").join("secret.mp3");
    for path in [outside.to_str().unwrap(), escape.to_str().unwrap(), "/no/such/file.mp3"] {
        let (status, body) = app
            .post("/api/video/generate", json!({"text": "Привет. Мир.", "audio_path": path}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert!(body["detail"].as_str().unwrap().contains("audio_path"));
    }

    let (status, _) = app
        .post("/api/video/generate", json!({"text": "Привет.", "audio_path": audio_dir.to_str().unwrap()}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/video/generate",
            json!({"text": "Привет. Мир.", "audio_path": inside.to_str().unwrap(), "duration": 5}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.finished_task(body["task_id"].as_str().unwrap()).await["status"], "completed");
}
