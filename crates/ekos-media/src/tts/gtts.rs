//! Google Translate speech endpoint.
//!
//! Text is sent in chunks of at most [`MAX_CHUNK_CHARS`] characters; the
//! returned MP3 frames are concatenated. A speed other than 1.0 is applied
//! afterwards with FFmpeg's `atempo` filter.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ekos_models::{TtsEngineKind, TtsRequest, TtsVoice};

use super::text::chunk_text;
use super::TtsEngine;
use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Longest text accepted by the endpoint per request.
pub const MAX_CHUNK_CHARS: usize = 200;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Speech synthesis through the Google Translate endpoint.
pub struct GoogleTts {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GoogleTts {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, lang: &str, idx: usize, total: usize) -> MediaResult<Vec<u8>> {
        let url = format!("{}/translate_tts", self.base_url);
        let textlen = chunk.chars().count().to_string();
        let total = total.to_string();
        let idx = idx.to_string();

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", lang),
                ("client", "tw-ob"),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::synthesis_failed(format!(
                "speech endpoint returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl TtsEngine for GoogleTts {
    fn kind(&self) -> TtsEngineKind {
        TtsEngineKind::Gtts
    }

    fn voices(&self) -> &'static [TtsVoice] {
        &[TtsVoice::Female]
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn synthesize(&self, request: &TtsRequest, output: &Path) -> MediaResult<()> {
        let chunks = chunk_text(&request.text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(MediaError::invalid_request("text must not be empty"));
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self
                .fetch_chunk(chunk, request.language.code(), idx, chunks.len())
                .await?;
            debug!(idx, bytes = bytes.len(), "Fetched speech chunk");
            audio.extend_from_slice(&bytes);
        }

        if (request.speed - 1.0).abs() < f32::EPSILON {
            tokio::fs::write(output, &audio).await?;
            return Ok(());
        }

        check_ffmpeg()?;
        let raw = tempfile::Builder::new().suffix(".mp3").tempfile()?;
        tokio::fs::write(raw.path(), &audio).await?;

        let cmd = FfmpegCommand::new(output)
            .input(raw.path())
            .audio_filter(format!("atempo={:.2}", request.speed))
            .audio_codec("libmp3lame")
            .audio_bitrate("128k");
        FfmpegRunner::new()
            .with_timeout(self.timeout.as_secs())
            .with_operation("tts_atempo")
            .run(&cmd)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_concatenates_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("tl", "ru"))
            .and(query_param("client", "tw-ob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3".to_vec()))
            .expect(2)
            .mount(&server)
            .await;

        let engine = GoogleTts::new(reqwest::Client::new(), server.uri(), 5);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("speech.mp3");

        let text = format!("{}. {}.", "а".repeat(150), "б".repeat(150));
        engine
            .synthesize(&TtsRequest::new(text), &out)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"ID3ID3");
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let engine = GoogleTts::new(reqwest::Client::new(), server.uri(), 5);
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .synthesize(&TtsRequest::new("hello"), &dir.path().join("x.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::SynthesisFailed(msg) if msg.contains("429")));
    }
}
