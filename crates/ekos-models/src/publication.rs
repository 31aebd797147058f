//! Publications of content on external platforms.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{ContentId, PublicationId};

/// Target social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Youtube,
    Instagram,
    Telegram,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Tiktok,
        Platform::Youtube,
        Platform::Instagram,
        Platform::Telegram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Telegram => "telegram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown platform: {s}"))
    }
}

/// Status of a publication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    #[default]
    Scheduled,
    Published,
    Failed,
}

/// A post of one content record on one platform.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Publication {
    pub id: PublicationId,
    pub content_id: ContentId,
    pub platform: Platform,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_post_id: Option<String>,

    #[serde(default)]
    pub status: PublicationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub platform_settings: Map<String, Value>,

    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub version: u64,
}

impl Publication {
    /// Record a successful post.
    pub fn published(content_id: ContentId, platform: Platform, post_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            platform_post_id: Some(post_id.into()),
            status: PublicationStatus::Published,
            published_at: Some(now),
            ..Self::empty(content_id, platform, now)
        }
    }

    /// Record a failed post.
    pub fn failed(content_id: ContentId, platform: Platform, error: impl Into<String>) -> Self {
        Self {
            status: PublicationStatus::Failed,
            error_message: Some(error.into()),
            ..Self::empty(content_id, platform, Utc::now())
        }
    }

    fn empty(content_id: ContentId, platform: Platform, now: DateTime<Utc>) -> Self {
        Self {
            id: PublicationId::new(),
            content_id,
            platform,
            platform_post_id: None,
            status: PublicationStatus::Scheduled,
            scheduled_at: None,
            published_at: None,
            platform_settings: Map::new(),
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            error_message: None,
            created_at: now,
            version: 0,
        }
    }
}
