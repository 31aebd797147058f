//! Content drafts and their generated artifacts.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::{ContentId, Platform, TaskId};

/// Kind of content being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Video,
    Text,
    Image,
    Audio,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Audio => "audio",
        }
    }
}

/// Editorial status of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Ready,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Ready => "ready",
            ContentStatus::Published => "published",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated artifact slot on a content record.
///
/// Each slot has a single writer: the task recorded in its task-id field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSlot {
    Tts,
    Video,
}

impl GenerationSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationSlot::Tts => "tts",
            GenerationSlot::Video => "video",
        }
    }
}

impl fmt::Display for GenerationSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of content and the artifacts generated for it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Content {
    pub id: ContentId,

    #[serde(rename = "type", default)]
    pub content_type: ContentType,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,

    /// Duration in seconds of the primary media artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Size in bytes of the primary media artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default)]
    pub status: ContentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_task_id: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_task_id: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_task_id: Option<TaskId>,

    #[serde(default)]
    pub target_platforms: Vec<Platform>,

    #[serde(default)]
    pub affiliate_links: Vec<String>,

    #[serde(default)]
    pub version: u64,
}

impl Content {
    /// Create a draft from a create request.
    pub fn from_create(req: ContentCreate) -> Self {
        let now = Utc::now();
        Self {
            id: ContentId::new(),
            content_type: req.content_type,
            title: req.title,
            description: req.description,
            topic: req.topic,
            keywords: req.keywords,
            script: None,
            audio_path: None,
            video_path: None,
            image_path: None,
            duration: None,
            size: None,
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
            generation_task_id: None,
            tts_task_id: None,
            video_task_id: None,
            target_platforms: req.target_platforms,
            affiliate_links: req.affiliate_links,
            version: 0,
        }
    }

    /// Text to narrate: script, then description, then title.
    pub fn narration_text(&self) -> Option<&str> {
        [
            self.script.as_deref(),
            self.description.as_deref(),
            Some(self.title.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
    }

    /// Task currently recorded as the writer of `slot`.
    pub fn slot_task(&self, slot: GenerationSlot) -> Option<&TaskId> {
        match slot {
            GenerationSlot::Tts => self.tts_task_id.as_ref(),
            GenerationSlot::Video => self.video_task_id.as_ref(),
        }
    }

    pub fn set_slot_task(&mut self, slot: GenerationSlot, task_id: TaskId) {
        match slot {
            GenerationSlot::Tts => self.tts_task_id = Some(task_id),
            GenerationSlot::Video => self.video_task_id = Some(task_id),
        }
        self.updated_at = Utc::now();
    }

    /// Artifact path currently stored for `slot`.
    pub fn slot_path(&self, slot: GenerationSlot) -> Option<&str> {
        match slot {
            GenerationSlot::Tts => self.audio_path.as_deref(),
            GenerationSlot::Video => self.video_path.as_deref(),
        }
    }

    pub fn set_slot_path(&mut self, slot: GenerationSlot, path: String) {
        match slot {
            GenerationSlot::Tts => self.audio_path = Some(path),
            GenerationSlot::Video => self.video_path = Some(path),
        }
        self.updated_at = Utc::now();
    }
}

/// Request body for creating content.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ContentCreate {
    #[serde(rename = "type", default)]
    pub content_type: ContentType,

    #[validate(length(min = 1, max = 300, message = "title must be 1-300 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub target_platforms: Vec<Platform>,

    #[serde(default)]
    pub affiliate_links: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> Content {
        Content::from_create(ContentCreate {
            content_type: ContentType::Video,
            title: title.to_string(),
            description: None,
            topic: "crypto".into(),
            keywords: vec![],
            target_platforms: vec![Platform::Telegram],
            affiliate_links: vec![],
        })
    }

    #[test]
    fn test_narration_text_prefers_script() {
        let mut content = draft("Title");
        content.description = Some("Description".into());
        assert_eq!(content.narration_text(), Some("Description"));

        content.script = Some("  Script body ".into());
        assert_eq!(content.narration_text(), Some("Script body"));
    }

    #[test]
    fn test_narration_text_skips_blank_fields() {
        let mut content = draft("   ");
        content.script = Some(" ".into());
        assert_eq!(content.narration_text(), None);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut content = draft("Title");
        let tts = TaskId::new();
        content.set_slot_task(GenerationSlot::Tts, tts.clone());
        assert_eq!(content.slot_task(GenerationSlot::Tts), Some(&tts));
        assert!(content.slot_task(GenerationSlot::Video).is_none());

        content.set_slot_path(GenerationSlot::Video, "out.mp4".into());
        assert_eq!(content.video_path.as_deref(), Some("out.mp4"));
        assert!(content.audio_path.is_none());
    }

    #[test]
    fn test_create_validation() {
        let req: ContentCreate = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert!(req.validate().is_err());
        assert_eq!(req.content_type, ContentType::Video);
    }
}
