//! Worker error types.

use thiserror::Error;

use reelforge_models::FailureReason;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Script generation failed: {0}")]
    ScriptFailed(String),

    #[error("Speech synthesis produced no result")]
    SynthesisFailed,

    #[error("No usable clips acquired: {0}")]
    InsufficientMaterial(String),

    #[error("Composition failed for {variant}: {message}")]
    CompositionFailed { variant: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(#[from] reelforge_store::StoreError),

    #[error("Match error: {0}")]
    Match(#[from] reelforge_match::MatchError),

    #[error("Media error: {0}")]
    Media(#[from] reelforge_media::MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] reelforge_providers::ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn script_failed(msg: impl Into<String>) -> Self {
        Self::ScriptFailed(msg.into())
    }

    pub fn insufficient_material(msg: impl Into<String>) -> Self {
        Self::InsufficientMaterial(msg.into())
    }

    pub fn composition_failed(variant: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CompositionFailed {
            variant: variant.into(),
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Typed reason recorded on the failed task record.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            WorkerError::ScriptFailed(msg) => FailureReason::Script(msg.clone()),
            WorkerError::SynthesisFailed => {
                FailureReason::Synthesis("synthesizer returned no result".to_string())
            }
            WorkerError::InsufficientMaterial(msg) => {
                FailureReason::InsufficientMaterial(msg.clone())
            }
            WorkerError::CompositionFailed { variant, message } => {
                FailureReason::Composition(format!("{}: {}", variant, message))
            }
            other => FailureReason::Internal(other.to_string()),
        }
    }
}
