//! Content ideas and scripts derived from trends.

mod gemini;
mod template;

pub use gemini::{parse_script, GeminiGenerator, DEFAULT_MODELS};
pub use template::{
    ideas_for_trends, monitored_content_title, trend_content_title, video_platforms, TemplateGenerator, MAX_IDEAS,
};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::TrendConfig;
use crate::error::TrendResult;

/// What a script should be about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptBrief {
    pub title: String,
    pub topic: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// A written script and the title it was written for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub title: String,
    pub script: String,
}

/// Writes narration scripts for content drafts.
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn write_script(&self, brief: &ScriptBrief) -> TrendResult<Script>;
}

/// Gemini when a key is configured, the template generator otherwise.
pub fn generator_from_config(config: &TrendConfig, http: reqwest::Client) -> Arc<dyn IdeaGenerator> {
    match &config.gemini_api_key {
        Some(key) => match GeminiGenerator::new(http, key.clone(), config.gemini_base_url.clone()) {
            Ok(generator) => Arc::new(generator),
            Err(e) => {
                warn!(error = %e, "Gemini generator unavailable, using templates");
                Arc::new(TemplateGenerator::new())
            }
        },
        None => Arc::new(TemplateGenerator::new()),
    }
}
