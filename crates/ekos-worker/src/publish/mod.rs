//! Posting content to external platforms.

mod telegram;

pub use telegram::TelegramPublisher;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use ekos_models::{Content, Platform};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Posts content on one platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Post `content` and return the platform's id for the post.
    async fn publish(&self, content: &Content) -> WorkerResult<String>;
}

/// Publishers keyed by platform.
#[derive(Clone, Default)]
pub struct PublisherRegistry {
    publishers: HashMap<Platform, Arc<dyn Publisher>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every publisher the configuration enables.
    pub fn from_config(config: &WorkerConfig, http: reqwest::Client) -> Self {
        let mut registry = Self::new();
        if let (Some(token), Some(chat_id)) = (&config.telegram_bot_token, &config.telegram_chat_id) {
            registry = registry.with_publisher(Arc::new(TelegramPublisher::new(
                http,
                config.telegram_api_url.clone(),
                token.clone(),
                chat_id.clone(),
            )));
        }
        registry
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publishers.insert(publisher.platform(), publisher);
        self
    }

    /// Platforms with a registered publisher, sorted.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.publishers.keys().copied().collect();
        platforms.sort();
        platforms
    }

    pub async fn publish(&self, platform: Platform, content: &Content) -> WorkerResult<String> {
        match self.publishers.get(&platform) {
            Some(publisher) => publisher.publish(content).await,
            None => Err(WorkerError::Unsupported(platform.to_string())),
        }
    }
}

/// Post text: title, description and keywords as hashtags.
pub fn caption(content: &Content, max_chars: usize) -> String {
    let mut parts = vec![content.title.trim().to_string()];
    if let Some(description) = content.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        parts.push(description.to_string());
    }
    let tags: Vec<String> = content
        .keywords
        .iter()
        .map(|k| k.trim().trim_start_matches('#').replace(' ', "_"))
        .filter(|k| !k.is_empty())
        .map(|k| format!("#{k}"))
        .collect();
    if !tags.is_empty() {
        parts.push(tags.join(" "));
    }

    let text = parts.join("\n\n");
    if text.chars().count() <= max_chars {
        text
    } else {
        text.chars().take(max_chars.saturating_sub(1)).chain(['…']).collect()
    }
}
