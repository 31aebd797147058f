//! Engagement analytics and the aggregated dashboard summary.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{ContentId, Platform, Publication, PublicationStatus};

/// Number of entries returned in [`AnalyticsSummary::top_content`].
pub const TOP_CONTENT_LIMIT: usize = 5;

/// Daily metrics for one content record on one platform.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Analytics {
    pub id: String,
    pub content_id: ContentId,
    pub platform: Platform,
    pub date: NaiveDate,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub subscribers_gained: u64,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Per-platform totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformStats {
    pub publications: u64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub revenue: f64,
}

/// A content record ranked by views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TopContent {
    pub content_id: ContentId,
    pub views: u64,
    pub likes: u64,
}

/// Aggregated analytics returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsSummary {
    pub total_views: u64,
    pub total_likes: u64,
    pub total_subscribers: u64,
    pub total_revenue: f64,
    pub top_content: Vec<TopContent>,
    pub platform_stats: BTreeMap<String, PlatformStats>,
}

impl AnalyticsSummary {
    /// Aggregate engagement from published posts and revenue/subscribers
    /// from daily analytics records.
    pub fn aggregate(publications: &[Publication], records: &[Analytics]) -> Self {
        let mut summary = Self::default();
        let mut per_content: HashMap<&ContentId, (u64, u64)> = HashMap::new();

        for publication in publications
            .iter()
            .filter(|p| p.status == PublicationStatus::Published)
        {
            summary.total_views += publication.views;
            summary.total_likes += publication.likes;

            let stats = summary
                .platform_stats
                .entry(publication.platform.as_str().to_string())
                .or_default();
            stats.publications += 1;
            stats.views += publication.views;
            stats.likes += publication.likes;
            stats.comments += publication.comments;
            stats.shares += publication.shares;

            let entry = per_content.entry(&publication.content_id).or_default();
            entry.0 += publication.views;
            entry.1 += publication.likes;
        }

        for record in records {
            summary.total_subscribers += record.subscribers_gained;
            summary.total_revenue += record.revenue;
            summary
                .platform_stats
                .entry(record.platform.as_str().to_string())
                .or_default()
                .revenue += record.revenue;
        }

        let mut top: Vec<TopContent> = per_content
            .into_iter()
            .map(|(content_id, (views, likes))| TopContent {
                content_id: content_id.clone(),
                views,
                likes,
            })
            .collect();
        top.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.content_id.cmp(&b.content_id)));
        top.truncate(TOP_CONTENT_LIMIT);
        summary.top_content = top;

        summary
    }
}
