//! Speech synthesis client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

/// Word-level timing emitted by the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingMark {
    /// Offset from the start of the narration, in seconds
    pub offset: f64,
    /// Spoken duration in seconds
    pub duration: f64,
    /// The spoken text
    pub text: String,
}

/// A successful synthesis: the rendered audio plus its timing marks.
#[derive(Debug, Clone)]
pub struct SpeechResult {
    /// Narration audio file
    pub audio_path: PathBuf,
    /// Total narration duration in seconds
    pub duration: f64,
    /// Word timing marks, in order
    pub marks: Vec<TimingMark>,
}

/// Narration synthesis collaborator.
///
/// `Ok(None)` signals the provider produced nothing usable, which is
/// fatal for the task, with no retry at this layer.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice` into `output`.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> ProviderResult<Option<SpeechResult>>;
}

/// Configuration for the synthesis HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSynthesizerConfig {
    /// Base URL of the synthesis service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpSynthesizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl HttpSynthesizerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("TTS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8002".to_string()),
            timeout: Duration::from_secs(
                std::env::var("TTS_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    /// Base64-encoded audio bytes
    audio: String,
    /// Narration duration in seconds
    duration: f64,
    #[serde(default)]
    marks: Vec<TimingMark>,
}

/// Client for the synthesis sidecar service.
pub struct HttpSynthesizer {
    http: Client,
    config: HttpSynthesizerConfig,
}

impl HttpSynthesizer {
    /// Create a new synthesizer client.
    pub fn new(config: HttpSynthesizerConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(HttpSynthesizerConfig::from_env())
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> ProviderResult<Option<SpeechResult>> {
        let url = format!("{}/synthesize", self.config.base_url);
        debug!("Requesting synthesis from {}", url);

        let response = self
            .http
            .post(&url)
            .json(&SynthesizeRequest { text, voice })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Synthesis service returned {}", response.status());
            return Ok(None);
        }

        let parsed: SynthesizeResponse = response.json().await?;
        if parsed.audio.is_empty() || parsed.duration <= 0.0 {
            warn!("Synthesis service returned no usable audio");
            return Ok(None);
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&parsed.audio)
            .map_err(|e| ProviderError::synthesis_failed(format!("bad audio payload: {}", e)))?;
        tokio::fs::write(output, &bytes).await?;

        info!(
            "Synthesized {:.1}s of narration with {} timing marks",
            parsed.duration,
            parsed.marks.len()
        );

        Ok(Some(SpeechResult {
            audio_path: output.to_path_buf(),
            duration: parsed.duration,
            marks: parsed.marks,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpSynthesizer {
        HttpSynthesizer::new(HttpSynthesizerConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_writes_audio() {
        let server = MockServer::start().await;
        let audio = base64::engine::general_purpose::STANDARD.encode(b"fake-mp3");
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "audio": audio,
                "duration": 2.5,
                "marks": [
                    { "offset": 0.0, "duration": 1.0, "text": "Hello" },
                    { "offset": 1.0, "duration": 1.5, "text": "world." }
                ]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("audio.mp3");
        let result = client(&server)
            .synthesize("Hello world.", "en-US-1", &out)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"fake-mp3");
        assert!((result.duration - 2.5).abs() < 1e-9);
        assert_eq!(result.marks.len(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_failure_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("audio.mp3");
        let result = client(&server).synthesize("x", "v", &out).await.unwrap();
        assert!(result.is_none());
        assert!(!out.exists());
    }
}
