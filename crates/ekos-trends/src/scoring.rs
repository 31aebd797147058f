//! Keyword relevance scoring, hashtag extraction and ranking.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use ekos_models::{Trend, DEFAULT_TREND_KEYWORDS};

/// Terms that add to the score of any text mentioning them.
pub const BONUS_TERMS: &[&str] = &["crypto", "bitcoin", "ethereum", "nft", "blockchain", "ai", "startup", "tech"];

/// Trends kept after ranking.
pub const MAX_RANKED_TRENDS: usize = 30;

/// Characters of the lowercase title used as the de-duplication key.
const DEDUP_PREFIX_CHARS: usize = 50;

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[а-яёa-z]+\b").unwrap());
static SIGNIFICANT_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[а-яёa-z]{3,}\b").unwrap());

/// Scores text against a set of target keywords.
#[derive(Debug, Clone)]
pub struct Scorer {
    keywords: Vec<String>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_KEYWORDS.iter().copied())
    }
}

impl Scorer {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Relevance of `text` in `0.0..=1.0`.
    pub fn relevance(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let trimmed = lower.trim();
        let head: String = lower.chars().take(100).collect();

        let mut score: f64 = 0.0;
        for keyword in &self.keywords {
            if !lower.contains(keyword.as_str()) {
                continue;
            }
            score += if trimmed == keyword {
                1.0
            } else if head.contains(keyword.as_str()) {
                0.5
            } else {
                0.3
            };
        }

        for term in BONUS_TERMS {
            if lower.contains(term) {
                score += 0.2;
            }
        }

        score.min(1.0)
    }

    /// Explicit `#tags`, else `#keyword` for up to three keyword words. At most five.
    pub fn hashtags(&self, text: &str) -> Vec<String> {
        let mut tags: Vec<String> = HASHTAG.find_iter(text).map(|m| m.as_str().to_string()).collect();

        if tags.is_empty() {
            let lower = text.to_lowercase();
            tags = WORD
                .find_iter(&lower)
                .map(|m| m.as_str())
                .filter(|w| self.keywords.iter().any(|k| k == w))
                .take(3)
                .map(|w| format!("#{w}"))
                .collect();
        }

        tags.truncate(5);
        tags
    }

    /// First keyword contained in the title, else its first word of three
    /// or more letters, else `trending`.
    pub fn main_keyword(&self, title: &str) -> String {
        let lower = title.to_lowercase();
        if let Some(keyword) = self.keywords.iter().find(|k| lower.contains(k.as_str())) {
            return keyword.clone();
        }
        SIGNIFICANT_WORD
            .find(&lower)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "trending".to_string())
    }
}

/// De-duplicate on the title prefix keeping the higher score, then keep the
/// [`MAX_RANKED_TRENDS`] most popular.
pub fn rank_trends(trends: Vec<Trend>) -> Vec<Trend> {
    let mut unique: HashMap<String, Trend> = HashMap::new();
    for trend in trends {
        let key: String = trend.description.to_lowercase().chars().take(DEDUP_PREFIX_CHARS).collect();
        match unique.get(&key) {
            Some(existing) if existing.popularity_score >= trend.popularity_score => {}
            _ => {
                unique.insert(key, trend);
            }
        }
    }

    let mut ranked: Vec<Trend> = unique.into_values().collect();
    ranked.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
    ranked.truncate(MAX_RANKED_TRENDS);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ekos_models::{TrendId, TrendSource};
    use serde_json::Map;

    fn trend(title: &str, score: f64) -> Trend {
        Trend {
            id: TrendId::new(),
            platform: "rss".to_string(),
            source: TrendSource::Rss,
            keyword: "k".to_string(),
            description: title.to_string(),
            popularity_score: score,
            hashtags: vec![],
            source_url: None,
            source_data: Map::new(),
            discovered_at: Utc::now(),
            last_updated: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn test_relevance_rules() {
        let scorer = Scorer::default();
        assert_eq!(scorer.relevance("Telegram"), 1.0);
        assert!((scorer.relevance("New telegram features") - 0.5).abs() < 1e-9);

        let late = format!("{} telegram", "x".repeat(120));
        assert!((scorer.relevance(&late) - 0.3).abs() < 1e-9);

        assert!((scorer.relevance("startup news") - 0.2).abs() < 1e-9);
        assert_eq!(scorer.relevance("nothing relevant here"), 0.0);
        assert_eq!(scorer.relevance("free crypto bitcoin telegram bot gift"), 1.0);
    }

    #[test]
    fn test_hashtags() {
        let scorer = Scorer::default();
        assert_eq!(scorer.hashtags("Big news #Telegram #bots"), vec!["#Telegram", "#bots"]);
        assert_eq!(
            scorer.hashtags("Free gift from Telegram bot and crypto"),
            vec!["#free", "#gift", "#telegram"]
        );
        assert_eq!(scorer.hashtags("#a #b #c #d #e #f").len(), 5);
        assert!(scorer.hashtags("plain words").is_empty());
    }

    #[test]
    fn test_main_keyword() {
        let scorer = Scorer::default();
        assert_eq!(scorer.main_keyword("Лучшие боты недели"), "боты");
        assert_eq!(scorer.main_keyword("An amazing day"), "amazing");
        assert_eq!(scorer.main_keyword("A b 12"), "trending");
    }

    #[test]
    fn test_rank_dedupes_and_sorts() {
        let ranked = rank_trends(vec![
            trend("Same title here", 0.4),
            trend("SAME TITLE HERE", 0.7),
            trend("Other", 0.9),
            trend("Third", 0.1),
        ]);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].description, "Other");
        assert_eq!(ranked[1].popularity_score, 0.7);
    }

    #[test]
    fn test_rank_keeps_thirty() {
        let trends = (0..40).map(|i| trend(&format!("title {i}"), i as f64 / 40.0)).collect();
        assert_eq!(rank_trends(trends).len(), MAX_RANKED_TRENDS);
    }
}
