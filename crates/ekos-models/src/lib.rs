//! Shared data models for the Ekosystema content pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Tasks and their status lifecycle
//! - Content drafts and publications
//! - Trends, analytics and system settings
//! - TTS and video generation requests

pub mod analytics;
pub mod content;
pub mod ids;
pub mod publication;
pub mod settings;
pub mod task;
pub mod trend;
pub mod tts;
pub mod video;

// Re-export common types
pub use analytics::{Analytics, AnalyticsSummary, PlatformStats, TopContent};
pub use content::{Content, ContentCreate, ContentStatus, ContentType, GenerationSlot};
pub use ids::{ContentId, PublicationId, TaskId, TrendId};
pub use publication::{Platform, Publication, PublicationStatus};
pub use settings::{
    ContentGenerationSettings, PublishingSettings, SystemSettings, TrendMonitoringSettings,
    DEFAULT_TREND_KEYWORDS, SETTINGS_ID,
};
pub use task::{Task, TaskCreate, TaskStatus, TaskType, TransitionError, MAX_TASK_LOGS};
pub use trend::{ContentIdea, Trend, TrendSource};
pub use tts::{TtsEngineKind, TtsLanguage, TtsRequest, TtsVoice, MAX_TTS_TEXT_CHARS};
pub use video::{
    Resolution, StylePalette, VideoParams, VideoStyle, VideoType, DEFAULT_VIDEO_DURATION,
    MAX_VIDEO_DURATION,
};
