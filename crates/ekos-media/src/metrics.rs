//! Media metrics collection.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// FFmpeg invocations by operation and outcome.
    pub const FFMPEG_RUNS_TOTAL: &str = "ffmpeg_runs_total";

    /// FFmpeg wall time in seconds by operation.
    pub const FFMPEG_DURATION_SECONDS: &str = "ffmpeg_duration_seconds";

    /// Speech syntheses by engine and outcome.
    pub const TTS_GENERATIONS_TOTAL: &str = "tts_generations_total";

    /// Speech synthesis wall time in seconds by engine.
    pub const TTS_DURATION_SECONDS: &str = "tts_duration_seconds";

    /// Video renders by video type and outcome.
    pub const VIDEO_RENDERS_TOTAL: &str = "video_renders_total";
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_ffmpeg_run(operation: &str, ok: bool, seconds: f64) {
    counter!(
        names::FFMPEG_RUNS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
    histogram!(names::FFMPEG_DURATION_SECONDS, "operation" => operation.to_string()).record(seconds);
}

pub fn record_tts(engine: &str, ok: bool, seconds: f64) {
    counter!(
        names::TTS_GENERATIONS_TOTAL,
        "engine" => engine.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
    histogram!(names::TTS_DURATION_SECONDS, "engine" => engine.to_string()).record(seconds);
}

pub fn record_video_render(video_type: &str, ok: bool) {
    counter!(
        names::VIDEO_RENDERS_TOTAL,
        "video_type" => video_type.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}
