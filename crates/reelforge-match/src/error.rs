//! Matcher error types.

use thiserror::Error;

pub type MatcherResult<T> = Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Embedding request failed: {0}")]
    Embedding(String),

    #[error("Embedding service returned an empty vector")]
    EmptyEmbedding,

    #[error("Embedding dimension mismatch: query {query}, record {record}")]
    DimensionMismatch { query: usize, record: usize },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MatchError {
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }
}
