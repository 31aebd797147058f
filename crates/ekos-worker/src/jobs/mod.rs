//! Background job definitions and their shared services.

mod content;
mod publish;
mod trends;
mod tts;
mod video;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use ekos_media::{TtsService, VideoGenerator};
use ekos_models::{ContentId, Platform, TaskId, TaskType, TtsRequest, VideoParams};
use ekos_store::{
    ContentRepository, DocumentStore, PublicationRepository, SettingsRepository, TaskTracker, TrendRepository,
};
use ekos_trends::{IdeaGenerator, TrendProvider};

use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::publish::PublisherRegistry;

/// Services a job can use.
#[derive(Clone)]
pub struct JobContext {
    pub tracker: TaskTracker,
    pub content: ContentRepository,
    pub publications: PublicationRepository,
    pub trends: TrendRepository,
    pub settings: SettingsRepository,
    pub tts: TtsService,
    pub video: VideoGenerator,
    pub collector: Arc<dyn TrendProvider>,
    pub ideas: Arc<dyn IdeaGenerator>,
    pub publishers: PublisherRegistry,
}

impl JobContext {
    /// Repositories over `store` plus the given engines.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        tts: TtsService,
        video: VideoGenerator,
        collector: Arc<dyn TrendProvider>,
        ideas: Arc<dyn IdeaGenerator>,
        publishers: PublisherRegistry,
    ) -> Self {
        Self {
            tracker: TaskTracker::new(store.clone()),
            content: ContentRepository::new(store.clone()),
            publications: PublicationRepository::new(store.clone()),
            trends: TrendRepository::new(store.clone()),
            settings: SettingsRepository::new(store),
            tts,
            video,
            collector,
            ideas,
            publishers,
        }
    }
}

/// What a video job renders.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Title, narration text and audio of a content record, read when the
    /// job starts
    Content(ContentId),
    /// Free text with optional narration
    Text {
        title: String,
        text: String,
        audio_path: Option<PathBuf>,
    },
}

/// One unit of background work, bound to the task that tracks it.
#[derive(Debug, Clone)]
pub enum Job {
    Tts {
        task_id: TaskId,
        content_id: Option<ContentId>,
        request: TtsRequest,
    },
    Video {
        task_id: TaskId,
        source: VideoSource,
        params: VideoParams,
    },
    TrendMonitoring {
        task_id: TaskId,
    },
    ContentGeneration {
        task_id: TaskId,
        content_id: ContentId,
    },
    Publish {
        task_id: TaskId,
        content_id: ContentId,
        /// Empty means the content's target platforms
        platforms: Vec<Platform>,
    },
}

impl Job {
    pub fn task_id(&self) -> &TaskId {
        match self {
            Job::Tts { task_id, .. }
            | Job::Video { task_id, .. }
            | Job::TrendMonitoring { task_id }
            | Job::ContentGeneration { task_id, .. }
            | Job::Publish { task_id, .. } => task_id,
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            Job::Tts { .. } => TaskType::TtsGeneration,
            Job::Video { .. } => TaskType::VideoGeneration,
            Job::TrendMonitoring { .. } => TaskType::TrendMonitoring,
            Job::ContentGeneration { .. } => TaskType::ContentGeneration,
            Job::Publish { .. } => TaskType::Publishing,
        }
    }
}

/// Result payload of a finished job and any jobs it spawned.
#[derive(Debug, Default)]
pub struct JobOutcome {
    pub result: Map<String, Value>,
    pub follow_ups: Vec<Job>,
}

impl JobOutcome {
    pub fn new(result: Map<String, Value>) -> Self {
        Self {
            result,
            follow_ups: Vec::new(),
        }
    }
}

/// Run `job` to completion. Marks the task running; the caller records the
/// final status.
pub async fn run(ctx: &JobContext, job: &Job, logger: &JobLogger) -> WorkerResult<JobOutcome> {
    match job {
        Job::Tts {
            task_id,
            content_id,
            request,
        } => tts::run(ctx, task_id, content_id.as_ref(), request, logger).await,
        Job::Video {
            task_id,
            source,
            params,
        } => video::run(ctx, task_id, source, params, logger).await,
        Job::TrendMonitoring { task_id } => trends::run(ctx, task_id, logger).await,
        Job::ContentGeneration { task_id, content_id } => content::run(ctx, task_id, content_id, logger).await,
        Job::Publish {
            task_id,
            content_id,
            platforms,
        } => publish::run(ctx, task_id, content_id, platforms, logger).await,
    }
}

/// Convert a serializable value into a result map.
pub(crate) fn to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
