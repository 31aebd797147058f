//! Local espeak-ng synthesizer.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use ekos_models::{TtsEngineKind, TtsRequest, TtsVoice};

use super::TtsEngine;
use crate::error::{MediaError, MediaResult};

/// Words per minute at speed 1.0.
pub const BASE_RATE_WPM: f32 = 150.0;

/// Amplitude passed to `-a` (espeak-ng default is 100).
const AMPLITUDE: u32 = 90;

/// Speech synthesis through the `espeak-ng` CLI, writing WAV.
pub struct EspeakTts {
    binary: String,
    timeout: Duration,
}

impl EspeakTts {
    pub fn new(binary: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Command-line arguments for `request`, writing to `output`.
    pub fn build_args(request: &TtsRequest, output: &Path) -> Vec<String> {
        let variant = match request.voice {
            TtsVoice::Male => "m3",
            TtsVoice::Female => "f3",
            TtsVoice::Child => "f5",
        };
        let rate = (BASE_RATE_WPM * request.speed).round() as u32;

        vec![
            "-v".to_string(),
            format!("{}+{}", request.language.code(), variant),
            "-s".to_string(),
            rate.to_string(),
            "-a".to_string(),
            AMPLITUDE.to_string(),
            "-w".to_string(),
            output.to_string_lossy().to_string(),
            "--stdin".to_string(),
        ]
    }
}

#[async_trait]
impl TtsEngine for EspeakTts {
    fn kind(&self) -> TtsEngineKind {
        TtsEngineKind::Espeak
    }

    fn voices(&self) -> &'static [TtsVoice] {
        &TtsVoice::ALL
    }

    fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    async fn synthesize(&self, request: &TtsRequest, output: &Path) -> MediaResult<()> {
        if !self.is_available() {
            return Err(MediaError::EngineUnavailable(format!(
                "{} not found in PATH",
                self.binary
            )));
        }

        let args = Self::build_args(request, output);
        debug!("Running {} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::internal("espeak-ng stdin not captured"))?;
        stdin.write_all(request.text.as_bytes()).await?;
        drop(stdin);

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(MediaError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            return Err(MediaError::synthesis_failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekos_models::TtsLanguage;

    #[test]
    fn test_args_map_voice_and_speed() {
        let mut req = TtsRequest::new("hello");
        req.language = TtsLanguage::En;
        req.voice = TtsVoice::Male;
        req.speed = 1.5;

        let args = EspeakTts::build_args(&req, Path::new("/tmp/out.wav"));
        assert_eq!(args[1], "en+m3");
        assert_eq!(args[3], "225");
        assert!(args.contains(&"/tmp/out.wav".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--stdin"));
    }

    #[test]
    fn test_supports_all_voices() {
        let engine = EspeakTts::new("espeak-ng", 10);
        assert_eq!(engine.voices().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = EspeakTts::new("definitely-not-espeak-binary", 10);
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .synthesize(&TtsRequest::new("hi"), &dir.path().join("a.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EngineUnavailable(_)));
    }
}
