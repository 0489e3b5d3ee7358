//! Text embedding client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MatchError, MatcherResult};

/// Handle to the external text-embedding model.
///
/// The handle is injected into the matcher at construction and outlives
/// all matcher calls; the matcher never mutates it. `embed` is
/// deterministic for identical input.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a non-empty text into a fixed-length vector.
    async fn embed(&self, text: &str) -> MatcherResult<Vec<f32>>;
}

/// Configuration for the HTTP embedder.
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Base URL of the embedding service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpEmbedderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("EMBEDDING_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("EMBEDDING_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Client for the embedding sidecar service.
pub struct HttpEmbedder {
    http: Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    /// Create a new embedder client.
    pub fn new(config: HttpEmbedderConfig) -> MatcherResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MatchError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MatcherResult<Self> {
        Self::new(HttpEmbedderConfig::from_env())
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> MatcherResult<Vec<f32>> {
        let url = format!("{}/embed", self.config.base_url);
        debug!("Requesting embedding from {}", url);

        let response = self
            .http
            .post(&url)
            .json(&EmbedRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MatchError::embedding(format!(
                "embedding service returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response.json().await?;
        if parsed.embedding.is_empty() {
            return Err(MatchError::EmptyEmbedding);
        }

        Ok(parsed.embedding)
    }
}
