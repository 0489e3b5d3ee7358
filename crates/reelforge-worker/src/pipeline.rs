//! The task pipeline state machine.
//!
//! Stages: script, terms, audio, subtitle, materials, composition.
//! Progress checkpoints follow each stage; recoverable errors are
//! logged and skipped, fatal ones transition the task to Failed with a
//! typed reason and no artifacts attached.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use reelforge_media::{bgm::pick_bgm, CombineRequest, RenderRequest};
use reelforge_models::{
    format_srt, parse_srt, split_terms, ConcatMode, SubtitleLine, TaskId, VideoParams,
};
use reelforge_providers::{
    correct_subtitles, subtitles_from_marks, SpeechResult, SubtitleProviderKind,
};

use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::materials::gather_materials;
use crate::progress::ProgressReporter;
use crate::retry::{retry_async, RetryConfig};

/// Contents of the persisted `script.json`.
#[derive(Debug, Serialize)]
struct ScriptArtifact<'a> {
    script: &'a str,
    search_terms: &'a [String],
    params: &'a VideoParams,
}

/// Run one task to a terminal state.
///
/// The returned error mirrors the typed failure already recorded on the
/// task record; callers only log it.
pub async fn run_task(
    ctx: &PipelineContext,
    task_id: TaskId,
    params: VideoParams,
) -> WorkerResult<()> {
    let reporter = ProgressReporter::new(ctx.task_store.clone(), task_id.clone());
    let logger = TaskLogger::new(&task_id, "pipeline");
    logger.log_start(&format!("subject '{}'", params.subject));

    match run_stages(ctx, &reporter, &params).await {
        Ok((videos, combined)) => {
            logger.log_completion(&format!("{} videos generated", videos.len()));
            reporter.complete(videos, combined).await
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            reporter.fail(e.failure_reason()).await?;
            Err(e)
        }
    }
}

async fn run_stages(
    ctx: &PipelineContext,
    reporter: &ProgressReporter,
    params: &VideoParams,
) -> WorkerResult<(Vec<String>, Vec<String>)> {
    let task_dir = ctx.config.task_dir(reporter.task_id().as_str());
    tokio::fs::create_dir_all(&task_dir).await?;

    reporter.processing(5).await?;

    // Script: caller-supplied text wins, otherwise generate.
    let script = resolve_script(ctx, params).await?;
    reporter.processing(10).await?;

    // Terms: caller-supplied terms win, otherwise generate. An empty
    // result is not fatal here; the materials stage decides.
    let terms = resolve_terms(ctx, params, &script).await;

    let artifact = ScriptArtifact {
        script: &script,
        search_terms: &terms,
        params,
    };
    tokio::fs::write(
        task_dir.join("script.json"),
        serde_json::to_string_pretty(&artifact)?,
    )
    .await?;
    reporter.processing(20).await?;

    // Audio: no narration, no task.
    let audio_path = task_dir.join("audio.mp3");
    let speech = ctx
        .synthesizer
        .synthesize(&script, &params.voice_name, &audio_path)
        .await
        .ok()
        .flatten()
        .ok_or(WorkerError::SynthesisFailed)?;
    let audio_duration = speech.duration.ceil();
    reporter.processing(30).await?;

    // Subtitles are best-effort: a provider chain that produces zero
    // parseable cues just means no subtitles.
    let subtitles = if params.subtitle_enabled {
        produce_subtitles(ctx, &task_dir, &script, &speech).await
    } else {
        Vec::new()
    };
    reporter.processing(40).await?;

    // Materials: search, rank, and download enough footage for every
    // requested variant.
    let clips = gather_materials(ctx, &terms, audio_duration * params.video_count as f64).await?;
    reporter.processing(50).await?;

    // Composition: combine then render each variant. More than one
    // variant forces random concat order so the outputs differ.
    let concat_mode = if params.video_count > 1 {
        ConcatMode::Random
    } else {
        params.concat_mode
    };
    let font_file = resolve_font(ctx, params);
    let bgm_file = pick_bgm(&params.bgm_type, &ctx.config.songs_dir);

    let mut videos = Vec::new();
    let mut combined_videos = Vec::new();
    let mut progress = 50.0_f64;
    let half_step = 50.0 / params.video_count as f64 / 2.0;

    for index in 1..=params.video_count {
        let combined = task_dir.join(format!("combined-{}.mp4", index));
        info!("Combining variant {} => {}", index, combined.display());

        let combine = CombineRequest {
            clips: clips.clone(),
            aspect: params.aspect,
            concat_mode,
            max_clip_duration: params.max_clip_duration,
            total_budget: audio_duration,
            threads: params.threads,
            output: combined.clone(),
        };
        ctx.compositor.combine(&combine).await.map_err(|e| {
            WorkerError::composition_failed(format!("combined-{}", index), e.to_string())
        })?;

        progress += half_step;
        reporter.processing(progress.round() as u8).await?;

        let final_path = task_dir.join(format!("final-{}.mp4", index));
        info!("Rendering variant {} => {}", index, final_path.display());

        let render = RenderRequest {
            video: combined.clone(),
            audio: audio_path.clone(),
            subtitles: subtitles.clone(),
            params: params.clone(),
            font_file: font_file.clone(),
            bgm_file: bgm_file.clone(),
            output: final_path.clone(),
        };
        ctx.compositor.generate(&render).await.map_err(|e| {
            WorkerError::composition_failed(format!("final-{}", index), e.to_string())
        })?;

        progress += half_step;
        reporter.processing(progress.round() as u8).await?;

        combined_videos.push(combined.to_string_lossy().to_string());
        videos.push(final_path.to_string_lossy().to_string());
    }

    Ok((videos, combined_videos))
}

async fn resolve_script(ctx: &PipelineContext, params: &VideoParams) -> WorkerResult<String> {
    let supplied = params.script.trim();
    if !supplied.is_empty() {
        return Ok(supplied.to_string());
    }

    let config = RetryConfig::new("generate_script");
    let script = retry_async(&config, || {
        ctx.script_generator.generate_script(
            &params.subject,
            &params.language,
            params.paragraph_count,
        )
    })
    .await
    .map_err(|e| WorkerError::script_failed(e.to_string()))?;

    if script.trim().is_empty() {
        return Err(WorkerError::script_failed("generator returned an empty script"));
    }
    Ok(script)
}

async fn resolve_terms(ctx: &PipelineContext, params: &VideoParams, script: &str) -> Vec<String> {
    if !params.terms.is_empty() {
        // Each entry may itself be a comma-joined list.
        return params
            .terms
            .iter()
            .flat_map(|t| split_terms(t))
            .collect();
    }

    let config = RetryConfig::new("generate_terms");
    match retry_async(&config, || {
        ctx.script_generator
            .generate_terms(&params.subject, script, ctx.config.term_count)
    })
    .await
    {
        Ok(terms) => terms,
        Err(e) => {
            warn!("Term generation failed: {}", e);
            Vec::new()
        }
    }
}

/// Run the configured subtitle provider, falling back from timing
/// alignment to transcription, then correct against the script.
async fn produce_subtitles(
    ctx: &PipelineContext,
    task_dir: &std::path::Path,
    script: &str,
    speech: &SpeechResult,
) -> Vec<SubtitleLine> {
    let subtitle_path = task_dir.join("subtitle.srt");
    let mut transcribed = false;

    match ctx.config.subtitle_provider {
        SubtitleProviderKind::TimingAligned => {
            let cues = subtitles_from_marks(script, &speech.marks);
            if !cues.is_empty() {
                if let Err(e) = tokio::fs::write(&subtitle_path, format_srt(&cues)).await {
                    warn!("Failed to write aligned subtitles: {}", e);
                }
            }
            if !subtitle_path.exists() {
                warn!("Timing-aligned subtitles missing, falling back to transcription");
                transcribed = transcribe_to(ctx, &speech.audio_path, &subtitle_path).await;
            }
        }
        SubtitleProviderKind::Transcription => {
            transcribed = transcribe_to(ctx, &speech.audio_path, &subtitle_path).await;
        }
    }

    let content = match tokio::fs::read_to_string(&subtitle_path).await {
        Ok(content) => content,
        Err(_) => {
            warn!("No subtitle file produced, proceeding without subtitles");
            return Vec::new();
        }
    };

    let mut lines = parse_srt(&content);
    if transcribed {
        lines = correct_subtitles(&lines, script);
        if let Err(e) = tokio::fs::write(&subtitle_path, format_srt(&lines)).await {
            warn!("Failed to write corrected subtitles: {}", e);
        }
    }

    if lines.is_empty() {
        warn!("Subtitle file parsed to zero cues, proceeding without subtitles");
    }
    lines
}

async fn transcribe_to(
    ctx: &PipelineContext,
    audio: &std::path::Path,
    output: &std::path::Path,
) -> bool {
    match ctx.transcriber.transcribe(audio, output).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Transcription failed, proceeding without subtitles: {}", e);
            false
        }
    }
}

fn resolve_font(ctx: &PipelineContext, params: &VideoParams) -> Option<PathBuf> {
    if !params.subtitle_enabled {
        return None;
    }

    let name = if params.font_name.is_empty() {
        &ctx.config.default_font
    } else {
        &params.font_name
    };

    let path = ctx.config.font_dir.join(name);
    if path.is_file() {
        Some(path)
    } else {
        warn!("Font not found, rendering without subtitles: {}", path.display());
        None
    }
}
