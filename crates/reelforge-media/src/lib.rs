//! FFmpeg CLI wrapper and media handling for Reelforge.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and running
//! - FFprobe-backed media validation
//! - Clip acquisition with a content-addressed local cache
//! - Pixel-accurate subtitle line wrapping
//! - Clip normalization, concatenation, and final render

pub mod acquire;
pub mod bgm;
pub mod command;
pub mod compose;
pub mod error;
pub mod filters;
pub mod layout;
pub mod probe;

pub use acquire::{cache_key, ClipAcquirer, ClipAcquirerConfig};
pub use bgm::pick_bgm;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compose::{combine_clips, generate_video, CombineRequest, RenderRequest};
pub use error::{MediaError, MediaResult};
pub use layout::{wrap, FontMeasurer, TextMeasurer, WrappedText};
pub use probe::{probe_video, VideoInfo};
