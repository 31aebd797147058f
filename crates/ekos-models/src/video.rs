//! Video generation parameters.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Default video length in seconds.
pub const DEFAULT_VIDEO_DURATION: u32 = 30;
/// Longest video accepted.
pub const MAX_VIDEO_DURATION: u32 = 120;

/// Layout of the rendered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    TextToVideo,
    ImageSlideshow,
    #[default]
    AnimatedText,
    TemplateBased,
}

impl VideoType {
    pub const ALL: [VideoType; 4] = [
        VideoType::TextToVideo,
        VideoType::ImageSlideshow,
        VideoType::AnimatedText,
        VideoType::TemplateBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::TextToVideo => "text_to_video",
            VideoType::ImageSlideshow => "image_slideshow",
            VideoType::AnimatedText => "animated_text",
            VideoType::TemplateBased => "template_based",
        }
    }
}

/// Colour scheme of the rendered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStyle {
    #[default]
    Modern,
    Classic,
    Minimal,
    Colorful,
    Dark,
}

/// Colours used to draw a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StylePalette {
    pub background: &'static str,
    pub background_alt: &'static str,
    pub text: &'static str,
    pub accent: &'static str,
}

impl VideoStyle {
    pub const ALL: [VideoStyle; 5] = [
        VideoStyle::Modern,
        VideoStyle::Classic,
        VideoStyle::Minimal,
        VideoStyle::Colorful,
        VideoStyle::Dark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStyle::Modern => "modern",
            VideoStyle::Classic => "classic",
            VideoStyle::Minimal => "minimal",
            VideoStyle::Colorful => "colorful",
            VideoStyle::Dark => "dark",
        }
    }

    pub fn palette(&self) -> StylePalette {
        match self {
            VideoStyle::Modern => StylePalette {
                background: "#667eea",
                background_alt: "#764ba2",
                text: "#ffffff",
                accent: "#ff6b35",
            },
            VideoStyle::Classic => StylePalette {
                background: "#2c3e50",
                background_alt: "#3498db",
                text: "#ecf0f1",
                accent: "#e74c3c",
            },
            VideoStyle::Minimal => StylePalette {
                background: "#f8f9fa",
                background_alt: "#e9ecef",
                text: "#212529",
                accent: "#007bff",
            },
            VideoStyle::Colorful => StylePalette {
                background: "#ff9a9e",
                background_alt: "#fecfef",
                text: "#ffffff",
                accent: "#ff6b9d",
            },
            VideoStyle::Dark => StylePalette {
                background: "#0f0f23",
                background_alt: "#1a1a2e",
                text: "#eeeeee",
                accent: "#00d2ff",
            },
        }
    }
}

impl fmt::Display for VideoStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output frame size, serialized as `"WIDTHxHEIGHT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const VERTICAL_HD: Resolution = Resolution::new(1080, 1920);

    pub const SUPPORTED: [Resolution; 5] = [
        Resolution::new(1080, 1920),
        Resolution::new(1920, 1080),
        Resolution::new(1080, 1080),
        Resolution::new(720, 1280),
        Resolution::new(1280, 720),
    ];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VERTICAL_HD
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Invalid resolution: {s}"))?;
        let parsed = Resolution::new(
            w.parse().map_err(|_| format!("Invalid resolution width: {s}"))?,
            h.parse().map_err(|_| format!("Invalid resolution height: {s}"))?,
        );
        if !parsed.is_supported() {
            return Err(format!("Unsupported resolution: {s}"));
        }
        Ok(parsed)
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl JsonSchema for Resolution {
    fn schema_name() -> String {
        "Resolution".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// Rendering parameters for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct VideoParams {
    #[serde(default)]
    pub video_type: VideoType,

    #[serde(default)]
    pub style: VideoStyle,

    #[serde(default)]
    pub resolution: Resolution,

    /// Requested length in seconds
    #[serde(default = "default_duration")]
    #[validate(range(min = 1, max = 120, message = "duration must be 1-120 seconds"))]
    pub duration: u32,

    #[serde(default = "default_fps")]
    #[validate(range(min = 1, max = 60))]
    pub fps: u32,

    #[serde(default = "default_font_size")]
    #[validate(range(min = 12, max = 200))]
    pub font_size: u32,

    /// Mux the content's narration audio when available
    #[serde(default = "default_include_audio")]
    pub include_audio: bool,
}

fn default_duration() -> u32 {
    DEFAULT_VIDEO_DURATION
}

fn default_fps() -> u32 {
    30
}

fn default_font_size() -> u32 {
    48
}

fn default_include_audio() -> bool {
    true
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            video_type: VideoType::default(),
            style: VideoStyle::default(),
            resolution: Resolution::default(),
            duration: default_duration(),
            fps: default_fps(),
            font_size: default_font_size(),
            include_audio: default_include_audio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse() {
        assert_eq!("720x1280".parse::<Resolution>().unwrap(), Resolution::new(720, 1280));
        assert!("640x480".parse::<Resolution>().is_err());
        assert!("wide".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_params_defaults_and_serde() {
        let params: VideoParams =
            serde_json::from_str(r#"{"style":"dark","resolution":"1920x1080"}"#).unwrap();
        assert_eq!(params.style, VideoStyle::Dark);
        assert_eq!(params.resolution, Resolution::new(1920, 1080));
        assert_eq!(params.duration, DEFAULT_VIDEO_DURATION);
        assert!(params.include_audio);
        assert!(params.validate().is_ok());

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["resolution"], "1920x1080");
    }

    #[test]
    fn test_duration_bounds() {
        let params = VideoParams {
            duration: MAX_VIDEO_DURATION + 1,
            ..VideoParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_palettes() {
        assert_eq!(VideoStyle::Dark.palette().accent, "#00d2ff");
        assert_eq!(VideoStyle::Minimal.palette().text, "#212529");
    }
}
