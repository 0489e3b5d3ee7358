//! Shared data models for the Reelforge pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Tasks and their lifecycle states
//! - Video generation parameters (aspect, concat mode, subtitles, bgm)
//! - Feature records and match results for material search
//! - Subtitle cues and SRT parsing

pub mod material;
pub mod params;
pub mod subtitle;
pub mod task;

// Re-export common types
pub use material::{ClipSelection, FeatureRecord, MatchResult, SelectedClip};
pub use params::{
    split_terms, BgmType, ConcatMode, SubtitlePosition, VideoAspect, VideoParams,
};
pub use subtitle::{format_srt, parse_srt, SubtitleLine};
pub use task::{FailureReason, TaskId, TaskRecord, TaskState};
