//! Trend collection and content idea generation.
//!
//! This crate provides:
//! - An RSS/Atom reader built on `quick-xml`
//! - Keyword relevance scoring, hashtag extraction and ranking
//! - A collector polling video, search and news feeds
//! - Idea templates and script writers (templates or Gemini)

pub mod collector;
pub mod config;
pub mod error;
pub mod feed;
pub mod ideas;
pub mod metrics;
pub mod scoring;

pub use collector::{score_entries, SourceRule, TrendCollector, TrendProvider};
pub use config::TrendConfig;
pub use error::{TrendError, TrendResult};
pub use feed::{parse_feed, FeedEntry};
pub use ideas::{
    generator_from_config, ideas_for_trends, monitored_content_title, trend_content_title, video_platforms,
    GeminiGenerator, IdeaGenerator, Script, ScriptBrief, TemplateGenerator,
};
pub use scoring::{rank_trends, Scorer};
