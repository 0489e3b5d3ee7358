//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during acquisition and composition.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    /// Remote fetch failed. Recoverable: skip the candidate.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Downloaded bytes do not decode as a usable clip. Recoverable:
    /// skip the candidate.
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Font load failed: {0}")]
    FontLoad(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a transfer failure error.
    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::TransferFailed(message.into())
    }

    /// Create an invalid-media error.
    pub fn invalid_media(message: impl Into<String>) -> Self {
        Self::InvalidMedia(message.into())
    }

    /// Whether the acquirer's caller should skip this candidate and
    /// try the next-ranked one instead of failing the task.
    pub fn is_recoverable_acquire(&self) -> bool {
        matches!(self, MediaError::TransferFailed(_) | MediaError::InvalidMedia(_))
    }
}
