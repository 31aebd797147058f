//! Telegram Bot API publisher.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use ekos_models::{Content, Platform};

use super::{caption, Publisher};
use crate::error::{WorkerError, WorkerResult};

/// Media captions are limited to 1024 characters.
const MAX_CAPTION_CHARS: usize = 1024;

/// Text messages are limited to 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<BotMessage>,
}

#[derive(Debug, Deserialize)]
struct BotMessage {
    message_id: i64,
}

/// Posts to a channel or chat through a bot.
///
/// Sends the video when the content has one, else the audio, else a text
/// message with the script.
pub struct TelegramPublisher {
    http: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramPublisher {
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    async fn send_media(&self, method: &str, field: &str, path: &Path, caption: String) -> WorkerResult<i64> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| field.to_string());

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption)
            .part(field.to_string(), Part::bytes(bytes).file_name(file_name));

        let response = self.http.post(self.method_url(method)).multipart(form).send().await?;
        Self::message_id(response.json().await?)
    }

    async fn send_message(&self, text: String) -> WorkerResult<i64> {
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": self.chat_id, "text": text }))
            .send()
            .await?;
        Self::message_id(response.json().await?)
    }

    fn message_id(response: BotResponse) -> WorkerResult<i64> {
        if !response.ok {
            return Err(WorkerError::publish_failed(
                response
                    .description
                    .unwrap_or_else(|| "Telegram rejected the request".to_string()),
            ));
        }
        response
            .result
            .map(|m| m.message_id)
            .ok_or_else(|| WorkerError::publish_failed("Telegram response has no message"))
    }
}

fn existing_file(path: Option<&str>) -> Option<&Path> {
    path.map(Path::new).filter(|p| p.is_file())
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn publish(&self, content: &Content) -> WorkerResult<String> {
        let message_id = if let Some(video) = existing_file(content.video_path.as_deref()) {
            self.send_media("sendVideo", "video", video, caption(content, MAX_CAPTION_CHARS))
                .await?
        } else if let Some(audio) = existing_file(content.audio_path.as_deref()) {
            self.send_media("sendAudio", "audio", audio, caption(content, MAX_CAPTION_CHARS))
                .await?
        } else {
            let mut text = caption(content, MAX_MESSAGE_CHARS);
            if let Some(script) = content.script.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                text = format!("{text}\n\n{script}");
            }
            self.send_message(text.chars().take(MAX_MESSAGE_CHARS).collect()).await?
        };

        info!(content_id = %content.id, message_id, "Published to Telegram");
        Ok(message_id.to_string())
    }
}
