//! Speech synthesis and video rendering for the content pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeout,
//!   cancellation and `-progress pipe:2` parsing
//! - FFprobe duration probing
//! - A registry of text-to-speech engines (Google speech endpoint, espeak-ng)
//! - Video rendering from text overlays, styles and narration audio

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod progress;
pub mod tts;
pub mod video;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, probe_media, MediaInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use tts::{EspeakTts, GoogleTts, TtsEngine, TtsInfo, TtsOutput, TtsService};
pub use video::{
    FfmpegRenderer, RenderPlan, VideoGenerator, VideoInfo, VideoOutput, VideoRenderer,
    VideoRequest,
};
