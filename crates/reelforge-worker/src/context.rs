//! Pipeline context and the seams it is assembled from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use reelforge_match::MaterialMatcher;
use reelforge_media::{
    acquire::{ClipAcquirer, ClipAcquirerConfig},
    combine_clips, generate_video, CombineRequest, MediaResult, RenderRequest,
};
use reelforge_providers::{
    ProviderResult, ScriptGenerator, SpeechSynthesizer, TranscriptionClient,
};
use reelforge_store::TaskStore;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Resolves a matched clip locator to a local file.
#[async_trait]
pub trait ClipFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> MediaResult<PathBuf>;
}

#[async_trait]
impl ClipFetcher for ClipAcquirer {
    async fn fetch(&self, locator: &str) -> MediaResult<PathBuf> {
        self.acquire(locator).await
    }
}

/// Combines clips and renders final artifacts.
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn combine(&self, request: &CombineRequest) -> MediaResult<PathBuf>;
    async fn generate(&self, request: &RenderRequest) -> MediaResult<PathBuf>;
}

/// Production compositor shelling out to FFmpeg.
#[derive(Debug, Default)]
pub struct FfmpegCompositor;

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn combine(&self, request: &CombineRequest) -> MediaResult<PathBuf> {
        combine_clips(request).await
    }

    async fn generate(&self, request: &RenderRequest) -> MediaResult<PathBuf> {
        generate_video(request).await
    }
}

/// Re-derives subtitle timing from rendered audio.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, output: &Path) -> ProviderResult<()>;
}

#[async_trait]
impl Transcriber for TranscriptionClient {
    async fn transcribe(&self, audio: &Path, output: &Path) -> ProviderResult<()> {
        TranscriptionClient::transcribe(self, audio, output).await
    }
}

/// Everything one task pipeline needs, assembled once per worker.
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub task_store: Arc<dyn TaskStore>,
    pub matcher: Arc<MaterialMatcher>,
    pub fetcher: Arc<dyn ClipFetcher>,
    pub compositor: Arc<dyn Compositor>,
    pub script_generator: Arc<dyn ScriptGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
}

impl PipelineContext {
    /// Build the production acquirer for this worker's cache directory.
    pub fn default_fetcher(config: &WorkerConfig) -> WorkerResult<Arc<dyn ClipFetcher>> {
        let acquirer = ClipAcquirer::new(&ClipAcquirerConfig::from_env(), &config.cache_dir)?;
        Ok(Arc::new(acquirer))
    }
}
