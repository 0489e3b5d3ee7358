//! External collaborators for the Reelforge pipeline.
//!
//! This crate provides:
//! - Script and search-term generation via an OpenAI-compatible chat API
//! - Speech synthesis client with word timing marks
//! - Subtitle providers (timing-aligned and transcription-based) with a
//!   script-alignment correction pass

pub mod error;
pub mod llm;
pub mod subtitle;
pub mod tts;

pub use error::{ProviderError, ProviderResult};
pub use llm::{ChatClient, ChatClientConfig, ScriptGenerator};
pub use subtitle::{
    correct_subtitles, subtitles_from_marks, SubtitleProviderKind, TranscriptionClient,
    TranscriptionClientConfig,
};
pub use tts::{HttpSynthesizer, HttpSynthesizerConfig, SpeechResult, SpeechSynthesizer, TimingMark};
