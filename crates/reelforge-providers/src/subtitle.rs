//! Subtitle providers and correction.
//!
//! Two providers are available: a fast one that aligns the script
//! against the synthesizer's own timing marks, and a slower
//! transcription service that re-derives timing from the rendered
//! audio. The orchestrator falls back from the first to the second and
//! then runs the correction pass against the script text.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reelforge_models::SubtitleLine;

use crate::error::{ProviderError, ProviderResult};
use crate::tts::TimingMark;

/// Which subtitle provider to run first. Selected once at
/// configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtitleProviderKind {
    /// Fast: build cues from the synthesizer's timing marks
    #[default]
    TimingAligned,
    /// Slow: transcribe the rendered audio
    Transcription,
}

impl FromStr for SubtitleProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "timing" | "aligned" | "timing_aligned" => Ok(Self::TimingAligned),
            "transcription" | "whisper" => Ok(Self::Transcription),
            other => Err(ProviderError::config_error(format!(
                "unknown subtitle provider: {}",
                other
            ))),
        }
    }
}

/// Build cues by aligning script sentences against timing marks.
///
/// Each sentence consumes marks until their combined spoken text covers
/// the sentence; the cue spans the first to the last consumed mark.
/// Returns an empty vec when the marks cannot cover a single sentence.
pub fn subtitles_from_marks(script: &str, marks: &[TimingMark]) -> Vec<SubtitleLine> {
    let sentences = split_sentences(script);
    let mut cues = Vec::new();
    let mut cursor = 0usize;

    for sentence in sentences {
        let target_len = normalize(&sentence).chars().count();
        if target_len == 0 || cursor >= marks.len() {
            break;
        }

        let start_mark = &marks[cursor];
        let mut covered = 0usize;
        let mut last = cursor;

        while cursor < marks.len() && covered < target_len {
            covered += normalize(&marks[cursor].text).chars().count();
            last = cursor;
            cursor += 1;
        }

        let end_mark = &marks[last];
        let end = end_mark.offset + end_mark.duration;
        if end <= start_mark.offset {
            continue;
        }

        cues.push(SubtitleLine {
            start: start_mark.offset,
            end,
            text: sentence,
        });
    }

    debug!("Aligned {} cues from {} timing marks", cues.len(), marks.len());
    cues
}

/// Replace cue text with the exact script spelling where the cue
/// matches a script span (ignoring case, whitespace, and punctuation).
/// Unmatched cues are left as transcribed; timing is never touched.
pub fn correct_subtitles(lines: &[SubtitleLine], script: &str) -> Vec<SubtitleLine> {
    // Script alphanumeric chars with their byte spans.
    let script_chars: Vec<(char, usize)> = script
        .char_indices()
        .filter(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| (c.to_lowercase().next().unwrap_or(c), i))
        .collect();

    let mut corrected = Vec::with_capacity(lines.len());
    let mut cursor = 0usize;

    for line in lines {
        let needle: Vec<char> = normalize(&line.text).chars().collect();
        if needle.is_empty() {
            corrected.push(line.clone());
            continue;
        }

        match find_sequence(&script_chars, &needle, cursor) {
            Some(at) => {
                let (_, first_byte) = script_chars[at];
                let (last_char, last_byte) = script_chars[at + needle.len() - 1];
                let end_byte = last_byte + last_char.len_utf8();
                corrected.push(SubtitleLine {
                    start: line.start,
                    end: line.end,
                    text: script[first_byte..end_byte].to_string(),
                });
                cursor = at + needle.len();
            }
            None => corrected.push(line.clone()),
        }
    }

    corrected
}

/// First position at or after `from` where `needle` occurs in the
/// lowercased script character stream.
fn find_sequence(haystack: &[(char, usize)], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&at| {
        needle
            .iter()
            .enumerate()
            .all(|(i, &c)| haystack[at + i].0 == c)
    })
}

/// Lowercase alphanumeric skeleton of a text.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Split a script into sentences on terminal punctuation.
fn split_sentences(script: &str) -> Vec<String> {
    const TERMINALS: &[char] = &['.', '!', '?', ';', '。', '！', '？', '；'];

    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in script.chars() {
        current.push(ch);
        if TERMINALS.contains(&ch) {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Configuration for the transcription client.
#[derive(Debug, Clone)]
pub struct TranscriptionClientConfig {
    /// Base URL of the transcription service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TranscriptionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8003".to_string(),
            timeout: Duration::from_secs(600),
        }
    }
}

impl TranscriptionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("TRANSCRIBE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8003".to_string()),
            timeout: Duration::from_secs(
                std::env::var("TRANSCRIBE_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    audio_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    srt: String,
}

/// Client for the transcription sidecar service.
pub struct TranscriptionClient {
    http: Client,
    config: TranscriptionClientConfig,
}

impl TranscriptionClient {
    /// Create a new transcription client.
    pub fn new(config: TranscriptionClientConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(TranscriptionClientConfig::from_env())
    }

    /// Transcribe `audio` and write the SRT to `output`.
    pub async fn transcribe(&self, audio: &Path, output: &Path) -> ProviderResult<()> {
        let url = format!("{}/transcribe", self.config.base_url);
        debug!("Requesting transcription from {}", url);

        let response = self
            .http
            .post(&url)
            .json(&TranscribeRequest {
                audio_path: &audio.to_string_lossy(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::transcription_failed(format!(
                "transcription service returned {}",
                status
            )));
        }

        let parsed: TranscribeResponse = response.json().await?;
        tokio::fs::write(output, parsed.srt.as_bytes()).await?;

        info!("Wrote transcription to {}", output.display());
        Ok(())
    }
}
