//! Singleton system settings document.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Platform, TtsVoice};

/// Document id of the settings singleton.
pub const SETTINGS_ID: &str = "system_settings";

/// Default trend keywords.
pub const DEFAULT_TREND_KEYWORDS: &[&str] = &[
    "telegram",
    "телеграм",
    "подарки",
    "боты",
    "bot",
    "бесплатно",
    "криптовалюта",
    "заработок",
    "деньги",
    "giveaway",
    "gift",
    "crypto",
    "bitcoin",
    "free",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContentGenerationSettings {
    /// Default video duration in seconds
    pub default_video_duration: u32,
    pub default_voice: TtsVoice,
    pub add_music: bool,
    pub add_affiliate_links: bool,
}

impl Default for ContentGenerationSettings {
    fn default() -> Self {
        Self {
            default_video_duration: 30,
            default_voice: TtsVoice::Female,
            add_music: true,
            add_affiliate_links: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PublishingSettings {
    pub auto_publish: bool,
    /// Free-form schedule, e.g. `{"telegram": "09:00"}`
    pub publish_schedule: BTreeMap<String, String>,
    pub platforms_enabled: Vec<Platform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TrendMonitoringSettings {
    pub enabled: bool,
    /// Seconds between automatic monitoring runs
    pub check_interval: u64,
    pub keywords: Vec<String>,
}

impl Default for TrendMonitoringSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: 3600,
            keywords: DEFAULT_TREND_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Operator-editable system settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SystemSettings {
    #[serde(default = "default_settings_id")]
    pub id: String,

    /// Platform API keys by name. Never returned unmasked by the API.
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,

    #[serde(default)]
    pub content_generation: ContentGenerationSettings,

    #[serde(default)]
    pub publishing: PublishingSettings,

    #[serde(default)]
    pub trend_monitoring: TrendMonitoringSettings,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub version: u64,
}

fn default_settings_id() -> String {
    SETTINGS_ID.to_string()
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            id: default_settings_id(),
            api_keys: BTreeMap::new(),
            content_generation: ContentGenerationSettings::default(),
            publishing: PublishingSettings::default(),
            trend_monitoring: TrendMonitoringSettings::default(),
            updated_at: Utc::now(),
            version: 0,
        }
    }
}

impl SystemSettings {
    /// Copy with API key values replaced by a mask.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        for value in copy.api_keys.values_mut() {
            *value = mask_secret(value);
        }
        copy
    }
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
