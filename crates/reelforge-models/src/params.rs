//! Video generation parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output aspect ratio, fixed to a pixel resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoAspect {
    /// 9:16, 1080x1920
    #[default]
    Portrait,
    /// 16:9, 1920x1080
    Landscape,
    /// 1:1, 1080x1080
    Square,
}

impl VideoAspect {
    /// Target resolution in pixels (width, height).
    pub fn to_resolution(&self) -> (u32, u32) {
        match self {
            VideoAspect::Portrait => (1080, 1920),
            VideoAspect::Landscape => (1920, 1080),
            VideoAspect::Square => (1080, 1080),
        }
    }

    /// Width over height.
    pub fn ratio(&self) -> f64 {
        let (w, h) = self.to_resolution();
        w as f64 / h as f64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoAspect::Portrait => "portrait",
            VideoAspect::Landscape => "landscape",
            VideoAspect::Square => "square",
        }
    }
}

impl fmt::Display for VideoAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoAspect {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(VideoAspect::Portrait),
            "landscape" => Ok(VideoAspect::Landscape),
            "square" => Ok(VideoAspect::Square),
            _ => Err(ParamParseError("aspect", s.to_string())),
        }
    }
}

/// Clip ordering when concatenating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcatMode {
    /// Preserve input order
    #[default]
    Sequential,
    /// Shuffle clips before concatenation
    Random,
}

impl FromStr for ConcatMode {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(ConcatMode::Sequential),
            "random" => Ok(ConcatMode::Random),
            _ => Err(ParamParseError("concat mode", s.to_string())),
        }
    }
}

/// Vertical anchor for burned-in subtitles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitlePosition {
    Top,
    #[default]
    Bottom,
    Center,
}

/// Background music selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum BgmType {
    /// No background music
    #[default]
    Off,
    /// Pick a random `*.mp3` from the configured songs directory
    Random,
    /// Use an explicit file
    File(String),
}

#[derive(Debug, Error)]
#[error("Unknown {0}: {1}")]
pub struct ParamParseError(&'static str, String);

fn default_paragraph_count() -> u32 {
    1
}

fn default_max_clip_duration() -> f64 {
    5.0
}

fn default_video_count() -> u32 {
    1
}

fn default_threads() -> u32 {
    2
}

fn default_font_size() -> u32 {
    60
}

fn default_text_color() -> String {
    "#FFFFFF".to_string()
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_stroke_width() -> f64 {
    1.5
}

fn default_volume() -> f64 {
    1.0
}

fn default_bgm_volume() -> f64 {
    0.2
}

fn default_subtitle_enabled() -> bool {
    true
}

/// Parameters for one video generation task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoParams {
    /// Subject the script is generated from
    pub subject: String,

    /// Caller-supplied script; generated when empty
    #[serde(default)]
    pub script: String,

    /// Caller-supplied search terms; generated when empty.
    /// A single string is comma-split (ASCII or CJK comma).
    #[serde(default)]
    pub terms: Vec<String>,

    /// Script language hint passed to the generator
    #[serde(default)]
    pub language: String,

    /// Paragraphs requested from the script generator
    #[serde(default = "default_paragraph_count")]
    pub paragraph_count: u32,

    /// Narration voice name
    #[serde(default)]
    pub voice_name: String,

    /// Output aspect ratio
    #[serde(default)]
    pub aspect: VideoAspect,

    /// Clip ordering mode
    #[serde(default)]
    pub concat_mode: ConcatMode,

    /// Per-clip maximum duration in seconds
    #[serde(default = "default_max_clip_duration")]
    pub max_clip_duration: f64,

    /// Number of final variants to render
    #[serde(default = "default_video_count")]
    pub video_count: u32,

    /// Encoder thread count
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// Whether subtitles are burned in
    #[serde(default = "default_subtitle_enabled")]
    pub subtitle_enabled: bool,

    /// Font file name, resolved against the configured font directory
    #[serde(default)]
    pub font_name: String,

    /// Subtitle font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Subtitle text color
    #[serde(default = "default_text_color")]
    pub text_color: String,

    /// Subtitle stroke color
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,

    /// Subtitle stroke width
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,

    /// Subtitle vertical anchor
    #[serde(default)]
    pub subtitle_position: SubtitlePosition,

    /// Narration volume factor
    #[serde(default = "default_volume")]
    pub voice_volume: f64,

    /// Background music selection
    #[serde(default)]
    pub bgm_type: BgmType,

    /// Background music volume factor
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f64,
}

impl VideoParams {
    /// Create params for a subject with everything else defaulted.
    pub fn new(subject: impl Into<String>) -> Self {
        serde_json::from_value(serde_json::json!({ "subject": subject.into() }))
            .expect("default params deserialize")
    }
}

/// Split a caller-supplied terms string on ASCII and CJK commas,
/// trimming whitespace and dropping empties.
pub fn split_terms(raw: &str) -> Vec<String> {
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
