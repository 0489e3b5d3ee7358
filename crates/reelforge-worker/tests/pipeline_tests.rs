//! End-to-end pipeline scenarios with faked collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reelforge_match::{MaterialMatcher, MatcherResult, TextEmbedder};
use reelforge_media::{CombineRequest, MediaError, MediaResult, RenderRequest};
use reelforge_models::{
    FailureReason, FeatureRecord, TaskId, TaskRecord, TaskState, VideoParams,
};
use reelforge_providers::{
    ProviderResult, ScriptGenerator, SpeechResult, SpeechSynthesizer, TimingMark,
};
use reelforge_store::{FeatureStore, MemoryTaskStore, StoreResult, TaskStore};
use reelforge_worker::{
    run_task, ClipFetcher, Compositor, PipelineContext, Transcriber, WorkerConfig,
};

/// Embeds every phrase to the same unit vector, so ranking follows
/// record similarity alone.
struct UniformEmbedder;

#[async_trait]
impl TextEmbedder for UniformEmbedder {
    async fn embed(&self, _text: &str) -> MatcherResult<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

struct FakeScripts;

#[async_trait]
impl ScriptGenerator for FakeScripts {
    async fn generate_script(
        &self,
        subject: &str,
        _language: &str,
        _paragraph_count: u32,
    ) -> ProviderResult<String> {
        Ok(format!("A short story about {}.", subject))
    }

    async fn generate_terms(
        &self,
        _subject: &str,
        _script: &str,
        count: u32,
    ) -> ProviderResult<Vec<String>> {
        Ok((0..count).map(|i| format!("term-{}", i)).collect())
    }
}

/// Synthesizer returning either a fixed result or nothing.
struct FakeSynth {
    produce: bool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        output: &Path,
    ) -> ProviderResult<Option<SpeechResult>> {
        if !self.produce {
            return Ok(None);
        }
        tokio::fs::write(output, b"narration").await?;
        Ok(Some(SpeechResult {
            audio_path: output.to_path_buf(),
            duration: 2.5,
            marks: vec![
                TimingMark { offset: 0.0, duration: 1.2, text: "Hello".into() },
                TimingMark { offset: 1.2, duration: 1.3, text: "world.".into() },
            ],
        }))
    }
}

struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &Path, output: &Path) -> ProviderResult<()> {
        tokio::fs::write(output, "1\n00:00:00,000 --> 00:00:02,500\nhello world\n").await?;
        Ok(())
    }
}

/// Writes a stub file per fetched locator; can fail specific locators.
struct FakeFetcher {
    dir: PathBuf,
    fail_containing: Option<String>,
    fetches: AtomicU32,
}

#[async_trait]
impl ClipFetcher for FakeFetcher {
    async fn fetch(&self, locator: &str) -> MediaResult<PathBuf> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_containing {
            if locator.contains(marker.as_str()) {
                return Err(MediaError::transfer_failed(locator));
            }
        }
        let name = locator.replace(['/', ':'], "_");
        let path = self.dir.join(name);
        tokio::fs::write(&path, b"clip").await?;
        Ok(path)
    }
}

/// Records composition calls and writes the requested outputs.
#[derive(Default)]
struct FakeCompositor {
    combines: Mutex<Vec<CombineRequest>>,
    renders: Mutex<Vec<RenderRequest>>,
}

#[async_trait]
impl Compositor for FakeCompositor {
    async fn combine(&self, request: &CombineRequest) -> MediaResult<PathBuf> {
        tokio::fs::write(&request.output, b"combined").await?;
        self.combines.lock().unwrap().push(request.clone());
        Ok(request.output.clone())
    }

    async fn generate(&self, request: &RenderRequest) -> MediaResult<PathBuf> {
        tokio::fs::write(&request.output, b"final").await?;
        self.renders.lock().unwrap().push(request.clone());
        Ok(request.output.clone())
    }
}

/// Task store wrapper that records every observed (state, progress).
#[derive(Clone)]
struct RecordingTaskStore {
    inner: MemoryTaskStore,
    history: Arc<Mutex<Vec<(TaskState, u8)>>>,
}

impl RecordingTaskStore {
    fn new() -> Self {
        Self {
            inner: MemoryTaskStore::new(),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl TaskStore for RecordingTaskStore {
    async fn get(&self, id: &TaskId) -> StoreResult<Option<TaskRecord>> {
        self.inner.get(id).await
    }

    async fn upsert(&self, record: TaskRecord) -> StoreResult<()> {
        self.history
            .lock()
            .unwrap()
            .push((record.state, record.progress));
        self.inner.upsert(record).await
    }
}

fn feature_records(count: usize) -> Vec<FeatureRecord> {
    (0..count)
        .map(|i| FeatureRecord {
            id: i as u64,
            title: format!("stock clip {}", i),
            content_loc: format!("https://clips.example.com/{}", i),
            thumbnail_loc: format!("https://thumbs.example.com/{}", i),
            embedding: vec![1.0, i as f32 * 0.05],
            duration: 5.0,
        })
        .collect()
}

struct Harness {
    ctx: PipelineContext,
    store: RecordingTaskStore,
    compositor: Arc<FakeCompositor>,
    _work: tempfile::TempDir,
}

fn harness(records: Vec<FeatureRecord>, synth_produces: bool) -> Harness {
    let work = tempfile::tempdir().unwrap();

    let mut features = FeatureStore::new();
    for record in records {
        features.insert(record).unwrap();
    }

    let config = WorkerConfig {
        work_dir: work.path().join("tasks"),
        cache_dir: work.path().join("cache"),
        songs_dir: work.path().join("songs"),
        font_dir: work.path().join("fonts"),
        ..WorkerConfig::default()
    };

    let store = RecordingTaskStore::new();
    let compositor = Arc::new(FakeCompositor::default());
    let fetch_dir = work.path().join("fetched");
    std::fs::create_dir_all(&fetch_dir).unwrap();

    let ctx = PipelineContext {
        config,
        task_store: Arc::new(store.clone()),
        matcher: Arc::new(MaterialMatcher::new(
            Arc::new(UniformEmbedder),
            Arc::new(features),
        )),
        fetcher: Arc::new(FakeFetcher {
            dir: fetch_dir,
            fail_containing: None,
            fetches: AtomicU32::new(0),
        }),
        compositor: compositor.clone(),
        script_generator: Arc::new(FakeScripts),
        synthesizer: Arc::new(FakeSynth { produce: synth_produces }),
        transcriber: Arc::new(FakeTranscriber),
    };

    Harness { ctx, store, compositor, _work: work }
}

fn scenario_params() -> VideoParams {
    let mut params = VideoParams::new("city life");
    params.script = "Hello world.".to_string();
    params.terms = vec!["cat".to_string(), "dog".to_string()];
    params.video_count = 2;
    params
}

async fn submit_and_run(harness: &Harness, params: VideoParams) -> TaskRecord {
    let id = TaskId::new();
    harness
        .ctx
        .task_store
        .upsert(TaskRecord::new(id.clone()))
        .await
        .unwrap();

    let _ = run_task(&harness.ctx, id.clone(), params).await;

    harness.ctx.task_store.get(&id).await.unwrap().unwrap()
}

#[tokio::test]
async fn scenario_a_two_variants_complete() {
    let harness = harness(feature_records(8), true);

    let record = submit_and_run(&harness, scenario_params()).await;

    assert_eq!(record.state, TaskState::Complete);
    assert_eq!(record.progress, 100);
    assert_eq!(record.videos.len(), 2);
    assert_eq!(record.combined_videos.len(), 2);
    assert!(record.videos[0].ends_with("final-1.mp4"));
    assert!(record.videos[1].ends_with("final-2.mp4"));
    for path in record.videos.iter().chain(record.combined_videos.iter()) {
        assert!(Path::new(path).exists());
    }

    // Two variants force randomized concat order.
    let combines = harness.compositor.combines.lock().unwrap();
    assert_eq!(combines.len(), 2);
    assert!(combines
        .iter()
        .all(|c| c.concat_mode == reelforge_models::ConcatMode::Random));

    // Progress never decreases and ends at 100.
    let history = harness.store.history.lock().unwrap();
    let progresses: Vec<u8> = history.iter().map(|(_, p)| *p).collect();
    assert!(progresses.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*progresses.last().unwrap(), 100);
}

#[tokio::test]
async fn scenario_b_synthesis_failure_is_fatal() {
    let harness = harness(feature_records(8), false);

    let record = submit_and_run(&harness, scenario_params()).await;

    assert_eq!(record.state, TaskState::Failed);
    assert!(record.videos.is_empty());
    assert!(record.combined_videos.is_empty());
    assert!(matches!(record.failure, Some(FailureReason::Synthesis(_))));

    // Composition never ran.
    assert!(harness.compositor.combines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scenario_c_no_material_is_fatal() {
    let harness = harness(Vec::new(), true);

    let record = submit_and_run(&harness, scenario_params()).await;

    assert_eq!(record.state, TaskState::Failed);
    assert!(record.videos.is_empty());
    assert!(matches!(
        record.failure,
        Some(FailureReason::InsufficientMaterial(_))
    ));
}

#[tokio::test]
async fn recoverable_fetch_failures_fall_through_to_next_candidates() {
    let mut harness = harness(feature_records(8), true);

    // Highest-ranked records fail to download; deeper candidates cover
    // the budget instead.
    harness.ctx.fetcher = Arc::new(FakeFetcher {
        dir: harness._work.path().join("fetched"),
        fail_containing: Some("clips.example.com/0".to_string()),
        fetches: AtomicU32::new(0),
    });

    let record = submit_and_run(&harness, scenario_params()).await;
    assert_eq!(record.state, TaskState::Complete);
}

#[tokio::test]
async fn caller_terms_comma_split() {
    let harness = harness(feature_records(8), true);

    let mut params = scenario_params();
    params.terms = vec!["cat, dog，bird".to_string()];
    params.video_count = 1;

    let record = submit_and_run(&harness, params).await;
    assert_eq!(record.state, TaskState::Complete);

    // Single variant keeps the sequential concat order.
    let combines = harness.compositor.combines.lock().unwrap();
    assert_eq!(combines.len(), 1);
    assert_eq!(
        combines[0].concat_mode,
        reelforge_models::ConcatMode::Sequential
    );

    // script.json was persisted with the split terms.
    let task_dir = harness.ctx.config.task_dir(record.id.as_str());
    let artifact: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(task_dir.join("script.json")).unwrap())
            .unwrap();
    assert_eq!(
        artifact["search_terms"],
        serde_json::json!(["cat", "dog", "bird"])
    );
}

#[tokio::test]
async fn subtitles_flow_to_render() {
    let harness = harness(feature_records(8), true);

    let mut params = scenario_params();
    params.video_count = 1;

    let record = submit_and_run(&harness, params).await;
    assert_eq!(record.state, TaskState::Complete);

    // Timing-aligned provider produced cues from the marks; the render
    // request carries them even though no font file exists.
    let renders = harness.compositor.renders.lock().unwrap();
    assert_eq!(renders.len(), 1);
    assert_eq!(renders[0].subtitles.len(), 1);
    assert_eq!(renders[0].subtitles[0].text, "Hello world.");
    assert!(renders[0].font_file.is_none());
}
