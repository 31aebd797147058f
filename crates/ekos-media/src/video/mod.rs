//! Video generation from text, a style and optional narration.

mod plan;

pub use plan::{split_sentences, wrap_text, AudioTrack, RenderPlan, TextSegment, FADE_SECS, MAX_SEGMENTS};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use ekos_models::{Resolution, VideoParams, VideoStyle, VideoType, DEFAULT_VIDEO_DURATION, MAX_VIDEO_DURATION};

use crate::command::{check_ffmpeg, FfmpegRunner};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::metrics::record_video_render;
use crate::probe::get_duration;
use crate::progress::ProgressCallback;

/// Executes a [`RenderPlan`].
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Length of an audio file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    async fn render(
        &self,
        plan: &RenderPlan,
        output: &Path,
        progress: Option<ProgressCallback>,
    ) -> MediaResult<()>;
}

/// Renders with the local `ffmpeg` binary.
pub struct FfmpegRenderer {
    timeout_secs: u64,
}

impl FfmpegRenderer {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    fn is_available(&self) -> bool {
        check_ffmpeg().is_ok()
    }

    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        get_duration(path).await
    }

    async fn render(
        &self,
        plan: &RenderPlan,
        output: &Path,
        progress: Option<ProgressCallback>,
    ) -> MediaResult<()> {
        // drawtext reads overlays from files so no text escaping is needed
        let workdir = tempfile::tempdir()?;
        let mut text_files = Vec::new();
        for (i, text) in plan.overlay_texts().into_iter().enumerate() {
            let path = workdir.path().join(format!("overlay_{i}.txt"));
            tokio::fs::write(&path, text).await?;
            text_files.push(path);
        }

        let cmd = plan.to_command(&text_files, output)?;
        let runner = FfmpegRunner::new()
            .with_timeout(self.timeout_secs)
            .with_operation("render_video");

        match progress {
            Some(callback) => runner.run_with_progress(&cmd, callback).await,
            None => runner.run(&cmd).await,
        }
    }
}

/// Input for one video.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub title: String,
    /// Text shown on screen
    pub text: String,
    pub params: VideoParams,
    /// Narration to mux when `params.include_audio` is set
    pub audio_path: Option<PathBuf>,
}

/// Result of a successful render.
#[derive(Debug, Clone, Serialize)]
pub struct VideoOutput {
    pub video_path: PathBuf,
    /// Length in seconds
    pub duration: f64,
    /// Size in bytes
    pub file_size: u64,
    /// Wall time of the render in seconds
    pub generation_time: f64,
    pub has_audio: bool,
    pub resolution: Resolution,
    pub style: VideoStyle,
}

/// Capabilities reported by `GET /api/video/info`.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    pub video_types: Vec<VideoType>,
    pub styles: Vec<VideoStyle>,
    pub resolutions: Vec<Resolution>,
    pub default_duration: u32,
    pub max_duration: u32,
    pub formats: Vec<&'static str>,
    pub ffmpeg_available: bool,
    pub font_file: Option<PathBuf>,
}

/// Plans and renders videos into one output directory.
#[derive(Clone)]
pub struct VideoGenerator {
    renderer: Arc<dyn VideoRenderer>,
    video_dir: PathBuf,
    font_file: Option<PathBuf>,
}

impl VideoGenerator {
    pub fn new(renderer: Arc<dyn VideoRenderer>, video_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            video_dir: video_dir.into(),
            font_file: None,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            renderer: Arc::new(FfmpegRenderer::new(config.ffmpeg_timeout_secs)),
            video_dir: config.video_dir.clone(),
            font_file: config.font_file.clone(),
        }
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    pub fn info(&self) -> VideoInfo {
        VideoInfo {
            video_types: VideoType::ALL.to_vec(),
            styles: VideoStyle::ALL.to_vec(),
            resolutions: Resolution::SUPPORTED.to_vec(),
            default_duration: DEFAULT_VIDEO_DURATION,
            max_duration: MAX_VIDEO_DURATION,
            formats: vec!["mp4"],
            ffmpeg_available: self.renderer.is_available(),
            font_file: self.font_file.clone(),
        }
    }

    /// Render `request` into `video_<request_id>_<timestamp>.mp4`.
    ///
    /// With audio included, the video lasts at least as long as the narration.
    pub async fn generate(
        &self,
        request: &VideoRequest,
        request_id: &str,
        progress: Option<ProgressCallback>,
    ) -> MediaResult<VideoOutput> {
        request
            .params
            .validate()
            .map_err(|e| MediaError::invalid_request(e.to_string()))?;
        if !request.params.resolution.is_supported() {
            return Err(MediaError::invalid_request(format!(
                "unsupported resolution {}",
                request.params.resolution
            )));
        }

        let audio = match (&request.audio_path, request.params.include_audio) {
            (Some(path), true) if path.exists() => Some(AudioTrack {
                path: path.clone(),
                duration: self.renderer.probe_duration(path).await?,
            }),
            (Some(path), true) => {
                warn!(path = %path.display(), "Narration file missing, rendering without audio");
                None
            }
            _ => None,
        };
        let has_audio = audio.is_some();

        let plan = RenderPlan::build(
            &request.title,
            &request.text,
            &request.params,
            audio,
            self.font_file.clone(),
        )?;

        tokio::fs::create_dir_all(&self.video_dir).await?;
        let video_path = self.video_dir.join(format!(
            "video_{}_{}.mp4",
            request_id,
            Utc::now().format("%Y%m%d_%H%M%S")
        ));

        let started = Instant::now();
        let result = self.renderer.render(&plan, &video_path, progress).await;
        let generation_time = started.elapsed().as_secs_f64();
        record_video_render(plan.video_type.as_str(), result.is_ok());
        result?;

        let file_size = match tokio::fs::metadata(&video_path).await {
            Ok(meta) => meta.len(),
            Err(_) => return Err(MediaError::FileNotFound(video_path)),
        };
        if file_size == 0 {
            let _ = tokio::fs::remove_file(&video_path).await;
            return Err(MediaError::EmptyOutput(video_path));
        }

        info!(
            path = %video_path.display(),
            duration = plan.total_duration,
            file_size,
            has_audio,
            generation_time,
            "Video rendered"
        );

        Ok(VideoOutput {
            video_path,
            duration: plan.total_duration,
            file_size,
            generation_time,
            has_audio,
            resolution: request.params.resolution,
            style: request.params.style,
        })
    }
}
