//! Media configuration.

use std::path::PathBuf;

/// Output locations, tool timeouts and engine endpoints.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory for generated audio
    pub audio_dir: PathBuf,
    /// Directory for generated video
    pub video_dir: PathBuf,
    /// FFmpeg render timeout
    pub ffmpeg_timeout_secs: u64,
    /// Timeout for one speech synthesis
    pub tts_timeout_secs: u64,
    /// Base URL of the Google speech endpoint
    pub gtts_base_url: String,
    /// espeak-ng binary name or path
    pub espeak_binary: String,
    /// Font for text overlays; FFmpeg's default font when unset
    pub font_file: Option<PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("generated_audio"),
            video_dir: PathBuf::from("generated_videos"),
            ffmpeg_timeout_secs: 600,
            tts_timeout_secs: 120,
            gtts_base_url: "https://translate.google.com".to_string(),
            espeak_binary: "espeak-ng".to_string(),
            font_file: None,
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            audio_dir: std::env::var("AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.audio_dir),
            video_dir: std::env::var("VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_dir),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ffmpeg_timeout_secs),
            tts_timeout_secs: std::env::var("TTS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.tts_timeout_secs),
            gtts_base_url: std::env::var("GTTS_BASE_URL").unwrap_or(defaults.gtts_base_url),
            espeak_binary: std::env::var("ESPEAK_BINARY").unwrap_or(defaults.espeak_binary),
            font_file: std::env::var("VIDEO_FONT_FILE").ok().map(PathBuf::from),
        }
    }
}
