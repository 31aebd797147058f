//! Fixed-template ideas and scripts.

use async_trait::async_trait;

use ekos_models::{ContentIdea, ContentType, Platform, Trend};

use super::{IdeaGenerator, Script, ScriptBrief};
use crate::error::TrendResult;

/// Ideas kept per collection run.
pub const MAX_IDEAS: usize = 20;

const VIDEO_TEMPLATES: [&str; 2] = [
    "Как использовать {keyword} для получения подарков в Telegram",
    "Топ-5 {keyword} ботов для бесплатных подарков",
];

const TEXT_TEMPLATE: &str = "Подробный гид по {keyword} в Telegram";

fn fill(template: &str, keyword: &str) -> String {
    template.replace("{keyword}", keyword)
}

/// Title of content created on demand from a stored trend.
pub fn trend_content_title(keyword: &str) -> String {
    format!("Топ-5 способов использовать {keyword} для получения подарков")
}

/// Title of content created automatically by a monitoring run.
pub fn monitored_content_title(keyword: &str) -> String {
    fill(VIDEO_TEMPLATES[0], keyword)
}

/// Platforms video ideas are aimed at.
pub fn video_platforms() -> Vec<Platform> {
    vec![Platform::Tiktok, Platform::Youtube, Platform::Telegram]
}

/// Two video ideas and one text idea per trend, at most [`MAX_IDEAS`].
pub fn ideas_for_trends(trends: &[Trend]) -> Vec<ContentIdea> {
    trends.iter().flat_map(ideas_for_trend).take(MAX_IDEAS).collect()
}

fn ideas_for_trend(trend: &Trend) -> Vec<ContentIdea> {
    let mut keywords = vec![trend.keyword.clone()];
    keywords.extend(trend.hashtags.iter().cloned());

    let idea = |title: String, content_type: ContentType, factor: f64, target_platforms: Vec<Platform>| ContentIdea {
        title,
        content_type,
        topic: trend.keyword.clone(),
        keywords: keywords.clone(),
        hashtags: trend.hashtags.clone(),
        source_trend: trend.description.clone(),
        estimated_popularity: trend.popularity_score * factor,
        target_platforms,
        script: None,
    };

    let mut ideas: Vec<ContentIdea> = VIDEO_TEMPLATES
        .iter()
        .map(|t| idea(fill(t, &trend.keyword), ContentType::Video, 0.8, video_platforms()))
        .collect();
    ideas.push(idea(
        fill(TEXT_TEMPLATE, &trend.keyword),
        ContentType::Text,
        0.6,
        vec![Platform::Telegram],
    ));
    ideas
}

/// Builds scripts from the brief without any external service.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn build_script(brief: &ScriptBrief) -> String {
        let title = brief.title.trim().trim_end_matches(['.', '!', '?']);
        let mut parts = Vec::new();

        if !title.is_empty() {
            parts.push(format!("{title}!"));
        }
        let description = brief.description.trim();
        if !description.is_empty() {
            parts.push(ensure_sentence(description));
        }
        let topic = brief.topic.trim();
        if !topic.is_empty() {
            parts.push(format!("Сегодня разбираем тему «{topic}»."));
        }
        let keywords: Vec<&str> = brief
            .keywords
            .iter()
            .map(|k| k.trim().trim_start_matches('#'))
            .filter(|k| !k.is_empty())
            .collect();
        if !keywords.is_empty() {
            parts.push(format!("Ключевые темы: {}.", keywords.join(", ")));
        }
        parts.push("Подписывайтесь, чтобы не пропустить новые выпуски!".to_string());

        parts.join(" ")
    }
}

fn ensure_sentence(text: &str) -> String {
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

#[async_trait]
impl IdeaGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn write_script(&self, brief: &ScriptBrief) -> TrendResult<Script> {
        Ok(Script {
            title: brief.title.trim().to_string(),
            script: Self::build_script(brief),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ekos_models::{TrendId, TrendSource};
    use serde_json::Map;

    fn trend(keyword: &str, score: f64) -> Trend {
        Trend {
            id: TrendId::new(),
            platform: "youtube".to_string(),
            source: TrendSource::Youtube,
            keyword: keyword.to_string(),
            description: format!("{keyword} is trending"),
            popularity_score: score,
            hashtags: vec![format!("#{keyword}")],
            source_url: None,
            source_data: Map::new(),
            discovered_at: Utc::now(),
            last_updated: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn test_three_ideas_per_trend() {
        let ideas = ideas_for_trends(&[trend("crypto", 1.0)]);
        assert_eq!(ideas.len(), 3);
        assert_eq!(ideas[0].content_type, ContentType::Video);
        assert_eq!(ideas[0].estimated_popularity, 0.8);
        assert_eq!(ideas[0].keywords, vec!["crypto", "#crypto"]);
        assert_eq!(ideas[2].content_type, ContentType::Text);
        assert_eq!(ideas[2].target_platforms, vec![Platform::Telegram]);
        assert!(ideas[1].title.contains("crypto"));
    }

    #[test]
    fn test_ideas_capped() {
        let trends: Vec<Trend> = (0..10).map(|i| trend(&format!("k{i}"), 0.5)).collect();
        assert_eq!(ideas_for_trends(&trends).len(), MAX_IDEAS);
    }

    #[tokio::test]
    async fn test_script_uses_brief() {
        let brief = ScriptBrief {
            title: "Бесплатные подарки".to_string(),
            topic: "gift".to_string(),
            description: "Обзор ботов".to_string(),
            keywords: vec!["gift".to_string(), "#telegram".to_string()],
        };
        let script = TemplateGenerator::new().write_script(&brief).await.unwrap();
        assert_eq!(script.title, "Бесплатные подарки");
        assert!(script.script.starts_with("Бесплатные подарки!"));
        assert!(script.script.contains("Обзор ботов."));
        assert!(script.script.contains("«gift»"));
        assert!(script.script.contains("gift, telegram"));
    }
}
