//! Trend source configuration.

/// Video platform trending feed.
pub const DEFAULT_YOUTUBE_FEED: &str = "https://www.youtube.com/feeds/trending.xml";

/// Daily search trends feed.
pub const DEFAULT_GOOGLE_FEED: &str = "https://trends.google.com/trends/trendingsearches/daily/rss?geo=RU&hl=ru";

/// Technology and crypto news feeds.
pub const DEFAULT_RSS_FEEDS: &[&str] = &[
    "https://vc.ru/rss",
    "https://habr.com/ru/rss/hub/cryptocurrency/",
    "https://coindesk.com/arc/outboundfeeds/rss/",
    "https://cointelegraph.com/rss",
    "https://feeds.feedburner.com/techcrunch/startups",
];

/// Feed URLs, timeouts and pacing for the collector.
#[derive(Debug, Clone)]
pub struct TrendConfig {
    /// Empty disables the source
    pub youtube_feed_url: String,
    /// Empty disables the source
    pub google_feed_url: String,
    pub rss_feeds: Vec<String>,
    pub request_timeout_secs: u64,
    /// Pause after the search-trend fetch
    pub google_delay_ms: u64,
    /// Pause between news feeds
    pub rss_delay_ms: u64,
    /// Gemini key; the template generator is used when unset
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            youtube_feed_url: DEFAULT_YOUTUBE_FEED.to_string(),
            google_feed_url: DEFAULT_GOOGLE_FEED.to_string(),
            rss_feeds: DEFAULT_RSS_FEEDS.iter().map(|s| s.to_string()).collect(),
            request_timeout_secs: 30,
            google_delay_ms: 1000,
            rss_delay_ms: 2000,
            gemini_api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl TrendConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            youtube_feed_url: std::env::var("TREND_YOUTUBE_FEED").unwrap_or(defaults.youtube_feed_url),
            google_feed_url: std::env::var("TREND_GOOGLE_FEED").unwrap_or(defaults.google_feed_url),
            rss_feeds: std::env::var("TREND_RSS_FEEDS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.rss_feeds),
            request_timeout_secs: std::env::var("TREND_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            google_delay_ms: std::env::var("TREND_GOOGLE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.google_delay_ms),
            rss_delay_ms: std::env::var("TREND_RSS_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rss_delay_ms),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
        }
    }
}
