//! Application state.

use std::sync::Arc;
use std::time::Duration;

use ekos_media::{MediaConfig, TtsService, VideoGenerator};
use ekos_store::{
    AnalyticsRepository, ContentRepository, DocumentStore, PublicationRepository, SettingsRepository,
    StoreConfig, StoreResult, TaskTracker, TrendRepository,
};
use ekos_trends::{generator_from_config, TrendCollector, TrendConfig};
use ekos_worker::{Job, JobContext, JobExecutor, PublisherRegistry, WorkerConfig};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::metrics::record_job_submitted;

/// Error recorded on tasks whose process went away before they finished.
pub const INTERRUPTED_MESSAGE: &str = "Interrupted by server restart";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn DocumentStore>,
    pub tracker: TaskTracker,
    pub content: ContentRepository,
    pub publications: PublicationRepository,
    pub trends: TrendRepository,
    pub settings: SettingsRepository,
    pub analytics: AnalyticsRepository,
    pub tts: TtsService,
    pub video: VideoGenerator,
    pub executor: JobExecutor,
}

impl AppState {
    /// State sharing the executor's repositories and engines.
    pub fn new(config: ApiConfig, store: Arc<dyn DocumentStore>, executor: JobExecutor) -> Self {
        let ctx = executor.context().clone();
        Self {
            config,
            analytics: AnalyticsRepository::new(store.clone()),
            store,
            tracker: ctx.tracker,
            content: ctx.content,
            publications: ctx.publications,
            trends: ctx.trends,
            settings: ctx.settings,
            tts: ctx.tts,
            video: ctx.video,
            executor,
        }
    }

    /// Build the store, engines and executor from environment variables.
    pub async fn from_env(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store_config = StoreConfig::from_env();
        let store = ekos_store::connect(&store_config).await?;
        info!(backend = store.backend_name(), "Document store connected");

        let media_config = MediaConfig::from_env();
        let trend_config = TrendConfig::from_env();
        let worker_config = WorkerConfig::from_env();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(trend_config.request_timeout_secs.max(media_config.tts_timeout_secs)))
            .user_agent(concat!("ekos/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tts = TtsService::from_config(&media_config, http.clone());
        let video = VideoGenerator::from_config(&media_config);
        let collector = Arc::new(TrendCollector::new(http.clone(), trend_config.clone()));
        let ideas = generator_from_config(&trend_config, http.clone());
        let publishers = PublisherRegistry::from_config(&worker_config, http);

        let ctx = JobContext::new(store.clone(), tts, video, collector, ideas, publishers);
        let executor = JobExecutor::new(worker_config, ctx);

        let state = Self::new(config, store, executor);
        state.fail_interrupted_tasks().await?;
        Ok(state)
    }

    /// Fail tasks a previous process left pending or running. Jobs live in
    /// process memory, so none of them can still finish.
    pub async fn fail_interrupted_tasks(&self) -> StoreResult<usize> {
        let interrupted = self.tracker.fail_unfinished(INTERRUPTED_MESSAGE).await?;
        if interrupted > 0 {
            warn!(count = interrupted, "Failed tasks left unfinished by a previous run");
        }
        Ok(interrupted)
    }

    /// Hand `job` to the background executor.
    ///
    /// A refused job fails its task, which also releases any generation
    /// slot the task holds.
    pub async fn submit(&self, job: Job) -> ApiResult<()> {
        let job_type = job.task_type();
        let task_id = job.task_id().clone();
        if let Err(e) = self.executor.submit(job) {
            if let Err(store_err) = self.tracker.fail(&task_id, e.to_string()).await {
                warn!(task_id = %task_id, error = %store_err, "Failed to mark refused task failed");
            }
            return Err(e.into());
        }
        record_job_submitted(job_type.as_str());
        Ok(())
    }
}
