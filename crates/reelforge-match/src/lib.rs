//! Semantic material matching.
//!
//! This crate provides:
//! - A text-embedding client trait with an HTTP implementation
//! - Cosine-similarity ranking of feature store records
//! - Greedy duration-budget clip selection

pub mod embed;
pub mod error;
pub mod matcher;
pub mod select;

pub use embed::{HttpEmbedder, HttpEmbedderConfig, TextEmbedder};
pub use error::{MatchError, MatcherResult};
pub use matcher::MaterialMatcher;
pub use select::select_for_duration;
