//! Collected trends and the content ideas derived from them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{ContentType, Platform, TrendId};

/// Where a trend was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    /// Video platform trending feed
    Youtube,
    /// Search trend feed
    Google,
    /// News / blog RSS feeds
    Rss,
}

impl TrendSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendSource::Youtube => "youtube",
            TrendSource::Google => "google",
            TrendSource::Rss => "rss",
        }
    }
}

impl fmt::Display for TrendSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trending topic with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Trend {
    pub id: TrendId,

    /// Platform label (e.g. "youtube", "google", or the feed host)
    pub platform: String,

    pub source: TrendSource,

    /// Main keyword extracted from the title
    pub keyword: String,

    /// Title of the source entry
    pub description: String,

    /// Popularity in 0.0..=1.0
    pub popularity_score: f64,

    #[serde(default)]
    pub hashtags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default)]
    pub source_data: Map<String, Value>,

    pub discovered_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub version: u64,
}

/// A content draft proposal generated from a trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentIdea {
    pub title: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub topic: String,
    pub keywords: Vec<String>,
    pub hashtags: Vec<String>,
    pub source_trend: String,
    pub estimated_popularity: f64,
    pub target_platforms: Vec<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}
