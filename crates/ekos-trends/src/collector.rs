//! Polls trend sources and turns relevant feed entries into [`Trend`]s.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use ekos_models::{Trend, TrendId, TrendSource};

use crate::config::TrendConfig;
use crate::error::{TrendError, TrendResult};
use crate::feed::{parse_feed, FeedEntry};
use crate::metrics::{record_feed_fetch, record_trends_collected};
use crate::scoring::{rank_trends, Scorer};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Longest description kept on a trend.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Per-source filtering and popularity jitter.
#[derive(Debug, Clone)]
pub struct SourceRule {
    pub source: TrendSource,
    /// Entries considered from the top of the feed
    pub max_entries: usize,
    /// Relevance must be strictly above this
    pub threshold: f64,
    /// Popularity = relevance × a factor drawn from this range
    pub jitter: RangeInclusive<f64>,
}

impl SourceRule {
    pub fn for_source(source: TrendSource) -> Self {
        match source {
            TrendSource::Youtube => Self {
                source,
                max_entries: 20,
                threshold: 0.3,
                jitter: 0.7..=1.0,
            },
            TrendSource::Google => Self {
                source,
                max_entries: 10,
                threshold: 0.2,
                jitter: 0.8..=1.0,
            },
            TrendSource::Rss => Self {
                source,
                max_entries: 15,
                threshold: 0.25,
                jitter: 0.6..=0.9,
            },
        }
    }
}

/// Source of ranked trends for a monitoring run.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    /// Ranked trends relevant to `keywords`; defaults apply when empty.
    async fn collect(&self, keywords: &[String]) -> Vec<Trend>;
}

/// Fetches trend feeds and scores their entries.
pub struct TrendCollector {
    http: reqwest::Client,
    config: TrendConfig,
}

impl TrendCollector {
    pub fn new(http: reqwest::Client, config: TrendConfig) -> Self {
        Self { http, config }
    }

    /// Poll every configured source. A failing source is logged and skipped.
    pub async fn collect(&self, keywords: &[String]) -> Vec<Trend> {
        let scorer = if keywords.is_empty() {
            Scorer::default()
        } else {
            Scorer::new(keywords)
        };
        let started = Instant::now();
        let mut all = Vec::new();

        if !self.config.youtube_feed_url.is_empty() {
            let found = self
                .collect_feed(&self.config.youtube_feed_url, TrendSource::Youtube, &scorer)
                .await;
            info!(count = found.len(), "Collected video platform trends");
            all.extend(found);
        }

        if !self.config.google_feed_url.is_empty() {
            let found = self
                .collect_feed(&self.config.google_feed_url, TrendSource::Google, &scorer)
                .await;
            info!(count = found.len(), "Collected search trends");
            all.extend(found);
            tokio::time::sleep(Duration::from_millis(self.config.google_delay_ms)).await;
        }

        for (i, url) in self.config.rss_feeds.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.rss_delay_ms)).await;
            }
            let found = self.collect_feed(url, TrendSource::Rss, &scorer).await;
            info!(feed = %url, count = found.len(), "Collected news feed trends");
            all.extend(found);
        }

        let ranked = rank_trends(all);
        record_trends_collected(ranked.len());
        info!(
            count = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trend collection finished"
        );
        ranked
    }

    async fn collect_feed(&self, url: &str, source: TrendSource, scorer: &Scorer) -> Vec<Trend> {
        let result = self.fetch_entries(url).await;
        record_feed_fetch(source.as_str(), result.is_ok());
        match result {
            Ok(entries) => score_entries(&entries, url, &SourceRule::for_source(source), scorer),
            Err(e) => {
                warn!(feed = %url, error = %e, "Feed fetch failed");
                Vec::new()
            }
        }
    }

    async fn fetch_entries(&self, url: &str) -> TrendResult<Vec<FeedEntry>> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrendError::FeedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        parse_feed(&response.text().await?)
    }
}

#[async_trait]
impl TrendProvider for TrendCollector {
    async fn collect(&self, keywords: &[String]) -> Vec<Trend> {
        TrendCollector::collect(self, keywords).await
    }
}

/// Score feed entries and build trends for those above the source threshold.
pub fn score_entries(entries: &[FeedEntry], feed_url: &str, rule: &SourceRule, scorer: &Scorer) -> Vec<Trend> {
    let mut rng = rand::rng();
    let host = feed_host(feed_url);
    let now = Utc::now();

    entries
        .iter()
        .take(rule.max_entries)
        .filter_map(|entry| {
            let text = format!("{} {}", entry.title, entry.summary);
            let relevance = scorer.relevance(&text);
            if relevance <= rule.threshold {
                return None;
            }

            let mut source_data = Map::new();
            source_data.insert("published".to_string(), json!(entry.published));
            source_data.insert(
                "summary".to_string(),
                Value::String(entry.summary.chars().take(MAX_DESCRIPTION_CHARS).collect()),
            );
            match rule.source {
                TrendSource::Youtube => {
                    source_data.insert("author".to_string(), json!(entry.author));
                }
                TrendSource::Google => {
                    source_data.insert("search_volume".to_string(), json!("high"));
                }
                TrendSource::Rss => {
                    source_data.insert("source_domain".to_string(), json!(host));
                }
            }

            let platform = match rule.source {
                TrendSource::Rss => format!("rss_{host}"),
                other => other.as_str().to_string(),
            };

            Some(Trend {
                id: TrendId::new(),
                platform,
                source: rule.source,
                keyword: scorer.main_keyword(&entry.title),
                description: entry.title.clone(),
                popularity_score: relevance * rng.random_range(rule.jitter.clone()),
                hashtags: scorer.hashtags(&text),
                source_url: (!entry.link.is_empty()).then(|| entry.link.clone()),
                source_data,
                discovered_at: now,
                last_updated: now,
                version: 0,
            })
        })
        .collect()
}

/// Host part of a URL, or the URL itself if it has none.
fn feed_host(url: &str) -> String {
    url.split("//")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or(url)
        .to_string()
}
