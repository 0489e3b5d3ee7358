//! Feature records and material match results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One candidate clip in the feature store.
///
/// Immutable once written. `thumbnail_loc` is the unique store key; the
/// embedding dimension is fixed by whatever model populated the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Store-assigned id
    pub id: u64,
    /// Human-readable title
    pub title: String,
    /// Locator of the full-resolution clip
    pub content_loc: String,
    /// Locator of the thumbnail the embedding was computed from (unique key)
    pub thumbnail_loc: String,
    /// Thumbnail embedding
    pub embedding: Vec<f32>,
    /// Clip duration in seconds, per store metadata
    pub duration: f64,
}

/// A ranked match for a search phrase. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Locator of the full-resolution clip
    pub content_loc: String,
    /// Clip duration in seconds, per store metadata
    pub duration: f64,
    /// Cosine similarity against the query embedding, approx [-1, 1]
    pub score: f32,
}

/// One clip accepted by the greedy duration fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectedClip {
    /// Locator of the full-resolution clip
    pub content_loc: String,
    /// Duration allotted to this clip, never above its source duration
    pub duration: f64,
}

/// Result of filling a duration budget from a ranked candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipSelection {
    /// Accepted clips, in ranking order
    pub clips: Vec<SelectedClip>,
    /// True when the ranked input ran out before the target was covered
    pub exhausted: bool,
}

impl ClipSelection {
    /// Total duration of the accepted clips.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
