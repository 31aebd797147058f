//! Gemini client for script writing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{IdeaGenerator, Script, ScriptBrief};
use crate::error::{TrendError, TrendResult};

/// Models tried in order until one answers with a usable script.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Writes scripts with a Gemini model.
pub struct GeminiGenerator {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> TrendResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TrendError::config_error("GEMINI_API_KEY not set"));
        }
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            client,
        })
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    fn build_prompt(brief: &ScriptBrief) -> String {
        format!(
            r#"Ты пишешь сценарий короткого вертикального видео (30-60 секунд) для TikTok, YouTube Shorts и Telegram.

Название: {title}
Тема: {topic}
Описание: {description}
Ключевые слова: {keywords}

Return ONLY a single JSON object with this schema:
{{
  "title": "Catchy title, max 100 characters",
  "script": "Narration text in Russian, 5-8 short sentences, no stage directions"
}}
"#,
            title = brief.title,
            topic = brief.topic,
            description = brief.description,
            keywords = brief.keywords.join(", "),
        )
    }

    async fn call_gemini_api(&self, model: &str, prompt: &str) -> TrendResult<Script> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TrendError::idea_failed(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TrendError::idea_failed(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| TrendError::idea_failed(format!("Failed to parse Gemini response: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| TrendError::idea_failed("No content in Gemini response"))?;

        parse_script(text)
    }
}

/// Parse the model's JSON answer, tolerating a markdown code fence.
pub fn parse_script(text: &str) -> TrendResult<Script> {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);

    let script: Script = serde_json::from_str(text.trim())
        .map_err(|e| TrendError::idea_failed(format!("Failed to parse script JSON: {}", e)))?;
    if script.script.trim().is_empty() {
        return Err(TrendError::idea_failed("Model returned an empty script"));
    }
    Ok(script)
}

#[async_trait]
impl IdeaGenerator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn write_script(&self, brief: &ScriptBrief) -> TrendResult<Script> {
        let prompt = Self::build_prompt(brief);
        let mut last_error = None;

        for model in &self.models {
            info!("Attempting Gemini API with model: {}", model);
            match self.call_gemini_api(model, &prompt).await {
                Ok(mut script) => {
                    if script.title.trim().is_empty() {
                        script.title = brief.title.clone();
                    }
                    info!("Got script from {}", model);
                    return Ok(script);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TrendError::idea_failed("All Gemini models failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn brief() -> ScriptBrief {
        ScriptBrief {
            title: "Crypto gifts".to_string(),
            topic: "crypto".to_string(),
            description: String::new(),
            keywords: vec!["crypto".to_string()],
        }
    }

    fn answer(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    #[test]
    fn test_parse_script_strips_fences() {
        let script = parse_script("```json\n{\"title\": \"T\", \"script\": \"Hello.\"}\n```").unwrap();
        assert_eq!(script.title, "T");
        assert_eq!(script.script, "Hello.");
        assert!(parse_script("{\"title\": \"T\", \"script\": \" \"}").is_err());
        assert!(parse_script("not json").is_err());
    }

    #[test]
    fn test_requires_api_key() {
        assert!(GeminiGenerator::new(Client::new(), "", "http://localhost").is_err());
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/first:generateContent"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/second:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer(
                "{\"title\": \"\", \"script\": \"Первое. Второе.\"}",
            )))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(Client::new(), "key", server.uri())
            .unwrap()
            .with_models(["first", "second"]);
        let script = generator.write_script(&brief()).await.unwrap();
        assert_eq!(script.title, "Crypto gifts");
        assert_eq!(script.script, "Первое. Второе.");
    }

    #[tokio::test]
    async fn test_all_models_failing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(Client::new(), "key", server.uri())
            .unwrap()
            .with_models(["only"]);
        let err = generator.write_script(&brief()).await.unwrap_err();
        assert!(matches!(err, TrendError::IdeaFailed(msg) if msg.contains("500")));
    }
}
