//! Text-to-speech request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Longest text accepted for a single synthesis.
pub const MAX_TTS_TEXT_CHARS: u64 = 5000;

/// Speech synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsEngineKind {
    /// Google Translate speech endpoint (MP3)
    #[default]
    Gtts,
    /// Local espeak-ng synthesizer (WAV)
    #[serde(alias = "local", alias = "pyttsx3")]
    Espeak,
}

impl TtsEngineKind {
    pub const ALL: [TtsEngineKind; 2] = [TtsEngineKind::Gtts, TtsEngineKind::Espeak];

    pub fn as_str(&self) -> &'static str {
        match self {
            TtsEngineKind::Gtts => "gtts",
            TtsEngineKind::Espeak => "espeak",
        }
    }

    /// File extension of the audio this engine writes.
    pub fn extension(&self) -> &'static str {
        match self {
            TtsEngineKind::Gtts => "mp3",
            TtsEngineKind::Espeak => "wav",
        }
    }
}

impl fmt::Display for TtsEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsVoice {
    Male,
    #[default]
    Female,
    Child,
}

impl TtsVoice {
    pub const ALL: [TtsVoice; 3] = [TtsVoice::Male, TtsVoice::Female, TtsVoice::Child];

    pub fn as_str(&self) -> &'static str {
        match self {
            TtsVoice::Male => "male",
            TtsVoice::Female => "female",
            TtsVoice::Child => "child",
        }
    }
}

impl fmt::Display for TtsVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TtsLanguage {
    #[default]
    Ru,
    En,
}

impl TtsLanguage {
    pub const ALL: [TtsLanguage; 2] = [TtsLanguage::Ru, TtsLanguage::En];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            TtsLanguage::Ru => "ru",
            TtsLanguage::En => "en",
        }
    }
}

impl fmt::Display for TtsLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Speech synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct TtsRequest {
    #[validate(
        length(min = 1, max = 5000, message = "text must be 1-5000 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,

    #[serde(default)]
    pub language: TtsLanguage,

    #[serde(default)]
    pub voice: TtsVoice,

    #[serde(default = "default_speed")]
    #[validate(range(min = 0.5, max = 2.0, message = "speed must be between 0.5 and 2.0"))]
    pub speed: f32,

    #[serde(default)]
    pub engine: TtsEngineKind,
}

fn default_speed() -> f32 {
    1.0
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("text must not be empty".into());
        return Err(err);
    }
    Ok(())
}

impl TtsRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: TtsLanguage::default(),
            voice: TtsVoice::default(),
            speed: default_speed(),
            engine: TtsEngineKind::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req: TtsRequest = serde_json::from_str(r#"{"text":"Привет"}"#).unwrap();
        assert_eq!(req.language, TtsLanguage::Ru);
        assert_eq!(req.voice, TtsVoice::Female);
        assert_eq!(req.engine, TtsEngineKind::Gtts);
        assert_eq!(req.speed, 1.0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_text() {
        assert!(TtsRequest::new("   ").validate().is_err());
        assert!(TtsRequest::new("").validate().is_err());
    }

    #[test]
    fn test_rejects_speed_out_of_range() {
        let mut req = TtsRequest::new("hello");
        req.speed = 2.5;
        assert!(req.validate().is_err());
        req.speed = 0.5;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_long_text() {
        let req = TtsRequest::new("a".repeat(MAX_TTS_TEXT_CHARS as usize + 1));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_engine_aliases() {
        let kind: TtsEngineKind = serde_json::from_str("\"pyttsx3\"").unwrap();
        assert_eq!(kind, TtsEngineKind::Espeak);
        assert!(serde_json::from_str::<TtsLanguage>("\"de\"").is_err());
    }
}
