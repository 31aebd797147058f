//! Text-to-speech engines and the service that dispatches to them.

mod espeak;
mod gtts;
pub mod text;

pub use espeak::EspeakTts;
pub use gtts::GoogleTts;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use ekos_models::{TtsEngineKind, TtsLanguage, TtsRequest, TtsVoice};

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::metrics::record_tts;
use crate::probe::get_duration;

/// A speech synthesis backend.
#[async_trait]
pub trait TtsEngine: Send + Sync {
    fn kind(&self) -> TtsEngineKind;

    /// Voices this engine can produce.
    fn voices(&self) -> &'static [TtsVoice];

    /// Whether the engine's tool or service can be used right now.
    fn is_available(&self) -> bool;

    /// Write speech for `request` to `output`.
    async fn synthesize(&self, request: &TtsRequest, output: &Path) -> MediaResult<()>;
}

/// Result of a successful synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct TtsOutput {
    pub audio_path: PathBuf,
    /// Size in bytes
    pub file_size: u64,
    /// Audio length in seconds, when FFprobe could read it
    pub duration: Option<f64>,
    /// Wall time of the synthesis in seconds
    pub generation_time: f64,
    pub engine_used: TtsEngineKind,
}

/// Capabilities reported by `GET /api/tts/info`.
#[derive(Debug, Clone, Serialize)]
pub struct TtsInfo {
    pub available_engines: Vec<TtsEngineKind>,
    pub engine_voices: BTreeMap<String, Vec<TtsVoice>>,
    pub supported_languages: Vec<TtsLanguage>,
    pub audio_formats: Vec<&'static str>,
    pub engines_available: BTreeMap<String, bool>,
}

/// Registry of engines writing into one audio directory.
#[derive(Clone)]
pub struct TtsService {
    engines: HashMap<TtsEngineKind, Arc<dyn TtsEngine>>,
    audio_dir: PathBuf,
}

impl TtsService {
    /// Empty registry; add engines with [`Self::with_engine`].
    pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            engines: HashMap::new(),
            audio_dir: audio_dir.into(),
        }
    }

    /// Registry with both built-in engines.
    pub fn from_config(config: &MediaConfig, http: reqwest::Client) -> Self {
        Self::new(&config.audio_dir)
            .with_engine(Arc::new(GoogleTts::new(
                http,
                config.gtts_base_url.clone(),
                config.tts_timeout_secs,
            )))
            .with_engine(Arc::new(EspeakTts::new(
                config.espeak_binary.clone(),
                config.tts_timeout_secs,
            )))
    }

    pub fn with_engine(mut self, engine: Arc<dyn TtsEngine>) -> Self {
        self.engines.insert(engine.kind(), engine);
        self
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn info(&self) -> TtsInfo {
        let mut kinds: Vec<TtsEngineKind> = self.engines.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());

        let mut engine_voices = BTreeMap::new();
        let mut engines_available = BTreeMap::new();
        let mut available_engines = Vec::new();
        for kind in kinds {
            let engine = &self.engines[&kind];
            engine_voices.insert(kind.as_str().to_string(), engine.voices().to_vec());
            let available = engine.is_available();
            engines_available.insert(kind.as_str().to_string(), available);
            if available {
                available_engines.push(kind);
            }
        }

        TtsInfo {
            available_engines,
            engine_voices,
            supported_languages: TtsLanguage::ALL.to_vec(),
            audio_formats: vec!["wav", "mp3"],
            engines_available,
        }
    }

    /// Synthesize `request` into `tts_<request_id>_<timestamp>.<ext>`.
    ///
    /// Fails before touching the filesystem if the request is invalid or
    /// the engine cannot produce the requested voice.
    pub async fn generate(&self, request: &TtsRequest, request_id: &str) -> MediaResult<TtsOutput> {
        request
            .validate()
            .map_err(|e| MediaError::invalid_request(e.to_string()))?;

        let engine = self
            .engines
            .get(&request.engine)
            .ok_or_else(|| MediaError::EngineUnavailable(request.engine.to_string()))?;

        if !engine.voices().contains(&request.voice) {
            return Err(MediaError::UnsupportedVoice {
                engine: request.engine.to_string(),
                voice: request.voice.to_string(),
            });
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let filename = format!(
            "tts_{}_{}.{}",
            request_id,
            Utc::now().format("%Y%m%d_%H%M%S"),
            request.engine.extension()
        );
        let audio_path = self.audio_dir.join(filename);

        let started = Instant::now();
        let result = engine.synthesize(request, &audio_path).await;
        let generation_time = started.elapsed().as_secs_f64();
        record_tts(request.engine.as_str(), result.is_ok(), generation_time);
        result?;

        let file_size = match tokio::fs::metadata(&audio_path).await {
            Ok(meta) => meta.len(),
            Err(_) => return Err(MediaError::FileNotFound(audio_path)),
        };
        if file_size == 0 {
            let _ = tokio::fs::remove_file(&audio_path).await;
            return Err(MediaError::EmptyOutput(audio_path));
        }

        let duration = match get_duration(&audio_path).await {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(path = %audio_path.display(), error = %e, "Could not probe audio duration");
                None
            }
        };

        info!(
            engine = %request.engine,
            path = %audio_path.display(),
            file_size,
            generation_time,
            "Speech generated"
        );

        Ok(TtsOutput {
            audio_path,
            file_size,
            duration,
            generation_time,
            engine_used: request.engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes fixed bytes instead of speech.
    struct FakeEngine {
        bytes: &'static [u8],
    }

    #[async_trait]
    impl TtsEngine for FakeEngine {
        fn kind(&self) -> TtsEngineKind {
            TtsEngineKind::Gtts
        }

        fn voices(&self) -> &'static [TtsVoice] {
            &[TtsVoice::Female]
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn synthesize(&self, _request: &TtsRequest, output: &Path) -> MediaResult<()> {
            tokio::fs::write(output, self.bytes).await?;
            Ok(())
        }
    }

    fn service(dir: &Path, bytes: &'static [u8]) -> TtsService {
        TtsService::new(dir).with_engine(Arc::new(FakeEngine { bytes }))
    }

    #[tokio::test]
    async fn test_generate_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = service(dir.path(), b"audio")
            .generate(&TtsRequest::new("Привет"), "req1")
            .await
            .unwrap();

        let name = out.audio_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tts_req1_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(out.file_size, 5);
        assert_eq!(out.engine_used, TtsEngineKind::Gtts);
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = service(dir.path(), b"")
            .generate(&TtsRequest::new("text"), "req2")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EmptyOutput(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_voice_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = TtsRequest::new("text");
        req.voice = TtsVoice::Male;

        let err = service(dir.path(), b"audio")
            .generate(&req, "req3")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedVoice { .. }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_unregistered_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = TtsRequest::new("text");
        req.engine = TtsEngineKind::Espeak;

        let err = service(dir.path(), b"audio")
            .generate(&req, "req4")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let dir = tempfile::tempdir().unwrap();
        let err = service(dir.path(), b"audio")
            .generate(&TtsRequest::new("  "), "req5")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidRequest(_)));
    }

    #[test]
    fn test_info_lists_engines() {
        let info = TtsService::from_config(&MediaConfig::default(), reqwest::Client::new()).info();
        assert_eq!(info.engine_voices["gtts"], vec![TtsVoice::Female]);
        assert_eq!(info.engine_voices["espeak"].len(), 3);
        assert!(info.engines_available["gtts"]);
        assert_eq!(info.supported_languages, vec![TtsLanguage::Ru, TtsLanguage::En]);
    }
}
