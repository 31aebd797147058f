//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Audio or video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// File size in bytes
    pub size: u64,
    pub has_video: bool,
    pub has_audio: bool,
    /// Width of the first video stream
    pub width: Option<u32>,
    /// Height of the first video stream
    pub height: Option<u32>,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe an audio or video file.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let video = probe.streams.iter().find(|s| s.codec_type == "video");

    Ok(MediaInfo {
        duration,
        size,
        has_video: video.is_some(),
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
    })
}

/// Get media duration in seconds.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    Ok(probe_media(path).await?.duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_probe() {
        let json = br#"{
            "streams": [{"codec_type": "audio", "codec_name": "mp3"}],
            "format": {"duration": "12.480000", "size": "99840"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 12.48).abs() < 1e-6);
        assert_eq!(info.size, 99840);
        assert!(info.has_audio);
        assert!(!info.has_video);
    }

    #[test]
    fn test_parse_video_probe() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1080, "height": 1920},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "30.0"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.width, Some(1080));
        assert_eq!(info.size, 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = probe_media("/nonexistent/file.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
