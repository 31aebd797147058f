//! Parsing of FFmpeg's `-progress` key/value stream.

use serde::{Deserialize, Serialize};

/// Keys FFmpeg writes in each `-progress` block.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "stream_0_0_q",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Snapshot emitted at the end of each progress block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    /// Encoded media time in milliseconds.
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime.
    pub speed: f64,
    /// Set by the final `progress=end` block.
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Share of `total_duration_ms` encoded so far, 0 to 100.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        (self.out_time_ms as f64 * 100.0 / total_duration_ms as f64).clamp(0.0, 100.0)
    }

    /// Fold one stderr line into the snapshot.
    ///
    /// Returns `None` for lines outside the progress stream, `Some(None)` for
    /// a progress field, and `Some(Some(snapshot))` when a block closes.
    pub fn apply_line(&mut self, line: &str) -> Option<Option<FfmpegProgress>> {
        let (key, value) = line.trim().split_once('=')?;
        if !PROGRESS_KEYS.contains(&key) {
            return None;
        }
        let value = value.trim();
        match key {
            // Both carry microseconds
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => self.frame = value.parse().unwrap_or(self.frame),
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(Some(self.clone()));
            }
            _ => {}
        }
        Some(None)
    }
}

/// Receives a snapshot per progress block.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + Sync + 'static>;
