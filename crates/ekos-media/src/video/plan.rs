//! Render plan: timing, layout and the FFmpeg filter graph for a video.
//!
//! Building a plan is pure so timing and filter output can be checked
//! without running FFmpeg.

use std::path::{Path, PathBuf};

use ekos_models::{StylePalette, VideoParams, VideoType};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Fade in/out length of each text overlay, in seconds.
pub const FADE_SECS: f64 = 0.5;

/// Upper bound on text overlays; extra sentences are merged.
pub const MAX_SEGMENTS: usize = 30;

/// Narration muxed under the video.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub path: PathBuf,
    /// Length in seconds
    pub duration: f64,
}

/// One text overlay and its time window.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    /// Word-wrapped text, lines separated by `\n`
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Everything needed to render one video.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub video_type: VideoType,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Output length in seconds, never shorter than the audio
    pub total_duration: f64,
    pub palette: StylePalette,
    pub font_size: u32,
    pub font_file: Option<PathBuf>,
    pub title: String,
    pub segments: Vec<TextSegment>,
    pub audio: Option<AudioTrack>,
}

impl RenderPlan {
    /// Lay out `text` over the requested duration, extended to cover the
    /// audio when present.
    pub fn build(
        title: &str,
        text: &str,
        params: &VideoParams,
        audio: Option<AudioTrack>,
        font_file: Option<PathBuf>,
    ) -> MediaResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MediaError::invalid_request("video text must not be empty"));
        }

        let audio_duration = audio.as_ref().map(|a| a.duration).unwrap_or(0.0);
        let total_duration = (params.duration as f64).max(audio_duration);

        let fps = match params.video_type {
            VideoType::ImageSlideshow => (params.fps / 10).max(1),
            _ => params.fps,
        };

        let width = params.resolution.width;
        let max_line_chars =
            ((width as f64 * 0.85) / (params.font_size as f64 * 0.55)).floor().max(10.0) as usize;

        let sentences = merge_to_limit(split_sentences(text), MAX_SEGMENTS);
        let per_segment = total_duration / sentences.len() as f64;
        let segments = sentences
            .iter()
            .enumerate()
            .map(|(i, sentence)| TextSegment {
                text: wrap_text(sentence, max_line_chars),
                start: i as f64 * per_segment,
                end: (i + 1) as f64 * per_segment,
            })
            .collect();

        Ok(Self {
            video_type: params.video_type,
            width,
            height: params.resolution.height,
            fps,
            total_duration,
            palette: params.style.palette(),
            font_size: params.font_size,
            font_file,
            title: wrap_text(title.trim(), max_line_chars),
            segments,
            audio,
        })
    }

    fn has_header(&self) -> bool {
        self.video_type == VideoType::TemplateBased && !self.title.is_empty()
    }

    /// Overlay texts in the order [`Self::to_command`] expects their files.
    pub fn overlay_texts(&self) -> Vec<&str> {
        let mut texts = Vec::with_capacity(self.segments.len() + 1);
        if self.has_header() {
            texts.push(self.title.as_str());
        }
        texts.extend(self.segments.iter().map(|s| s.text.as_str()));
        texts
    }

    /// Build the FFmpeg command. `text_files` hold [`Self::overlay_texts`]
    /// in the same order.
    pub fn to_command(&self, text_files: &[PathBuf], output: &Path) -> MediaResult<FfmpegCommand> {
        if text_files.len() != self.overlay_texts().len() {
            return Err(MediaError::internal(format!(
                "expected {} overlay files, got {}",
                self.overlay_texts().len(),
                text_files.len()
            )));
        }

        let mut cmd = FfmpegCommand::new(output).lavfi(format!(
            "color=c={}:s={}x{}:r={}:d={:.3}",
            ffmpeg_color(self.palette.background),
            self.width,
            self.height,
            self.fps,
            self.total_duration
        ));
        if let Some(audio) = &self.audio {
            cmd = cmd.input(&audio.path);
        }

        let mut graph = format!("[0:v]{}[v]", self.video_filters(text_files).join(","));
        if self.audio.is_some() {
            graph.push_str(&format!(";[1:a]apad,atrim=0:{:.3}[a]", self.total_duration));
        }

        cmd = cmd.filter_complex(graph).map("[v]");
        if self.audio.is_some() {
            cmd = cmd.map("[a]").audio_codec("aac").audio_bitrate("128k");
        }

        Ok(cmd
            .video_codec("libx264")
            .preset("veryfast")
            .crf(23)
            .output_args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .frame_rate(self.fps)
            .duration(self.total_duration))
    }

    fn video_filters(&self, text_files: &[PathBuf]) -> Vec<String> {
        let mut filters = Vec::new();
        let mut files = text_files.iter();
        let accent = ffmpeg_color(self.palette.accent);

        match self.video_type {
            VideoType::ImageSlideshow => {
                // Alternate the background per slide
                for segment in self.segments.iter().skip(1).step_by(2) {
                    filters.push(format!(
                        "drawbox=x=0:y=0:w=iw:h=ih:color={}:t=fill:enable='{}'",
                        ffmpeg_color(self.palette.background_alt),
                        between(segment.start, segment.end)
                    ));
                }
            }
            _ => {
                filters.push(format!(
                    "drawbox=x=0:y=ih*2/3:w=iw:h=ih/3:color={}@0.35:t=fill",
                    ffmpeg_color(self.palette.background_alt)
                ));
                filters.push(format!("drawbox=x=0:y=ih-ih/40:w=iw:h=ih/40:color={accent}@0.9:t=fill"));
            }
        }

        if self.has_header() {
            filters.push(format!("drawbox=x=0:y=0:w=iw:h=ih/8:color={accent}@0.9:t=fill"));
            if let Some(file) = files.next() {
                filters.push(format!(
                    "{}:x=(w-text_w)/2:y=(h/8-text_h)/2",
                    self.drawtext(file, (self.font_size as f64 * 0.8) as u32)
                ));
            }
        }

        let fades = self.video_type != VideoType::ImageSlideshow;
        for (segment, file) in self.segments.iter().zip(files) {
            let mut filter = format!(
                "{}:x=(w-text_w)/2:y=(h-text_h)/2:enable='{}'",
                self.drawtext(file, self.font_size),
                between(segment.start, segment.end)
            );
            if fades {
                filter.push_str(&format!(":alpha='{}'", fade_alpha(segment.start, segment.end)));
            }
            filters.push(filter);
        }

        filters
    }

    fn drawtext(&self, text_file: &Path, font_size: u32) -> String {
        let mut filter = String::from("drawtext=");
        if let Some(font) = &self.font_file {
            filter.push_str(&format!("fontfile='{}':", font.display()));
        }
        filter.push_str(&format!(
            "textfile='{}':fontcolor={}:fontsize={}:line_spacing={}:shadowcolor=black@0.4:shadowx=2:shadowy=2",
            text_file.display(),
            ffmpeg_color(self.palette.text),
            font_size,
            font_size / 4
        ));
        filter
    }
}

fn between(start: f64, end: f64) -> String {
    format!("between(t,{:.3},{:.3})", start, end)
}

/// Alpha ramp: fade in over the first [`FADE_SECS`], out over the last.
fn fade_alpha(start: f64, end: f64) -> String {
    let fade = FADE_SECS.min((end - start) / 2.0);
    format!(
        "if(lt(t,{fi:.3}),(t-{s:.3})/{f:.3},if(gt(t,{fo:.3}),({e:.3}-t)/{f:.3},1))",
        fi = start + fade,
        fo = end - fade,
        s = start,
        e = end,
        f = fade
    )
}

/// `#rrggbb` to FFmpeg's `0xrrggbb`.
fn ffmpeg_color(hex: &str) -> String {
    format!("0x{}", hex.trim_start_matches('#'))
}

/// Split into sentences on `.`, `!`, `?` and line breaks.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join neighbouring sentences so at most `limit` remain.
fn merge_to_limit(sentences: Vec<String>, limit: usize) -> Vec<String> {
    if sentences.len() <= limit {
        return sentences;
    }
    let group = sentences.len().div_ceil(limit);
    sentences.chunks(group).map(|c| c.join(". ")).collect()
}

/// Greedy word wrap to `max_chars` characters per line.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekos_models::{Resolution, VideoStyle};

    fn params(duration: u32) -> VideoParams {
        VideoParams {
            duration,
            ..VideoParams::default()
        }
    }

    fn files(plan: &RenderPlan) -> Vec<PathBuf> {
        (0..plan.overlay_texts().len())
            .map(|i| PathBuf::from(format!("/tmp/seg_{i}.txt")))
            .collect()
    }

    #[test]
    fn test_sentences_share_duration() {
        let plan = RenderPlan::build("T", "One. Two. Three. Four.", &params(20), None, None).unwrap();
        assert_eq!(plan.segments.len(), 4);
        assert_eq!(plan.segments[0].start, 0.0);
        assert!((plan.segments[1].start - 5.0).abs() < 1e-9);
        assert!((plan.segments[3].end - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_extends_to_cover_audio() {
        let audio = AudioTrack {
            path: PathBuf::from("voice.mp3"),
            duration: 42.7,
        };
        let plan = RenderPlan::build("T", "Hello world.", &params(30), Some(audio), None).unwrap();
        assert!(plan.total_duration >= 42.7);

        let args = plan
            .to_command(&files(&plan), Path::new("out.mp4"))
            .unwrap()
            .build_args();
        assert!(args.contains(&"42.700".to_string()));
        assert!(args.contains(&"voice.mp3".to_string()));
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("[1:a]apad,atrim=0:42.700[a]"));
    }

    #[test]
    fn test_short_audio_keeps_requested_duration() {
        let audio = AudioTrack {
            path: PathBuf::from("voice.mp3"),
            duration: 3.0,
        };
        let plan = RenderPlan::build("T", "Hello.", &params(15), Some(audio), None).unwrap();
        assert_eq!(plan.total_duration, 15.0);
    }

    #[test]
    fn test_filter_uses_palette_and_fades() {
        let mut p = params(10);
        p.style = VideoStyle::Dark;
        p.resolution = Resolution::new(1280, 720);
        let plan = RenderPlan::build("T", "First. Second.", &p, None, None).unwrap();
        let args = plan
            .to_command(&files(&plan), Path::new("out.mp4"))
            .unwrap()
            .build_args();

        assert!(args.contains(&"color=c=0x0f0f23:s=1280x720:r=30:d=10.000".to_string()));
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("textfile='/tmp/seg_1.txt'"));
        assert!(graph.contains("fontcolor=0xeeeeee"));
        assert!(graph.contains("enable='between(t,5.000,10.000)'"));
        assert!(graph.contains("alpha='if(lt(t,5.500)"));
        assert!(!args.contains(&"[a]".to_string()));
    }

    #[test]
    fn test_slideshow_lowers_fps_and_skips_fades() {
        let mut p = params(10);
        p.video_type = VideoType::ImageSlideshow;
        let plan = RenderPlan::build("T", "A. B.", &p, None, None).unwrap();
        assert_eq!(plan.fps, 3);

        let args = plan.to_command(&files(&plan), Path::new("o.mp4")).unwrap().build_args();
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(!graph.contains("alpha="));
    }

    #[test]
    fn test_template_adds_title_overlay() {
        let mut p = params(10);
        p.video_type = VideoType::TemplateBased;
        let plan = RenderPlan::build("Big title", "Body.", &p, None, None).unwrap();
        assert_eq!(plan.overlay_texts(), vec!["Big title", "Body"]);
        assert!(plan.to_command(&[], Path::new("o.mp4")).is_err());
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(RenderPlan::build("T", "  ", &params(10), None, None).is_err());
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three four", 9), "one two\nthree\nfour");
        assert_eq!(wrap_text("supercalifragilistic", 5), "supercalifragilistic");
    }

    #[test]
    fn test_many_sentences_are_merged() {
        let text: String = (0..65).map(|i| format!("S{i}. ")).collect();
        let plan = RenderPlan::build("T", &text, &params(60), None, None).unwrap();
        assert!(plan.segments.len() <= MAX_SEGMENTS);
    }
}
