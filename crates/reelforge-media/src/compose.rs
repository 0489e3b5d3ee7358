//! Clip combination and final rendering.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use reelforge_models::{ConcatMode, SubtitleLine, SubtitlePosition, VideoAspect, VideoParams};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{drawtext_filter, normalize_filter, voice_bgm_filter, voice_filter};
use crate::layout::{wrap, FontMeasurer, TextMeasurer};
use crate::probe::probe_video;

/// Output frame rate for every rendered artifact.
pub const OUTPUT_FPS: u32 = 30;

/// Inputs for combining acquired clips into one normalized stream.
#[derive(Debug, Clone)]
pub struct CombineRequest {
    /// Acquired clip files
    pub clips: Vec<PathBuf>,
    /// Output aspect ratio
    pub aspect: VideoAspect,
    /// Clip ordering
    pub concat_mode: ConcatMode,
    /// Per-clip duration cap in seconds
    pub max_clip_duration: f64,
    /// Total duration budget in seconds
    pub total_budget: f64,
    /// Encoder thread count
    pub threads: u32,
    /// Output file
    pub output: PathBuf,
}

/// Inputs for rendering the final artifact.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Combined video stream
    pub video: PathBuf,
    /// Narration audio
    pub audio: PathBuf,
    /// Timed subtitle cues (used as given)
    pub subtitles: Vec<SubtitleLine>,
    /// Styling and volume parameters
    pub params: VideoParams,
    /// Resolved subtitle font file
    pub font_file: Option<PathBuf>,
    /// Resolved background music file
    pub bgm_file: Option<PathBuf>,
    /// Output file
    pub output: PathBuf,
}

/// Normalize, truncate, and concatenate clips against the duration
/// budget.
///
/// Every clip is stripped of audio, forced to 30 fps, and letterboxed
/// to the target resolution. Random concat mode shuffles the input
/// order first. Each clip contributes at most `max_clip_duration`
/// seconds; once the running total would exceed `total_budget` the
/// current clip is trimmed to the remaining budget and iteration halts.
/// Budgeting uses real probed durations, which may differ from the
/// store metadata the matcher saw.
pub async fn combine_clips(req: &CombineRequest) -> MediaResult<PathBuf> {
    if req.clips.is_empty() {
        return Err(MediaError::invalid_media("no clips to combine"));
    }

    let mut ordered = req.clips.clone();
    if req.concat_mode == ConcatMode::Random {
        ordered.shuffle(&mut rand::rng());
    }

    // Probe everything up front; undecodable files are skipped.
    let mut durations = Vec::with_capacity(ordered.len());
    let mut usable = Vec::with_capacity(ordered.len());
    for clip in &ordered {
        match probe_video(clip).await {
            Ok(info) if info.is_decodable() => {
                durations.push(info.duration);
                usable.push(clip.clone());
            }
            Ok(_) => warn!("Skipping undecodable clip: {}", clip.display()),
            Err(e) => warn!("Skipping unprobable clip {}: {}", clip.display(), e),
        }
    }

    let allotments = plan_allotments(&durations, req.max_clip_duration, req.total_budget);
    if allotments.is_empty() {
        return Err(MediaError::invalid_media("no usable clips after probing"));
    }

    let (width, height) = req.aspect.to_resolution();
    let segment_dir = segment_dir_for(&req.output);
    tokio::fs::create_dir_all(&segment_dir).await?;

    let runner = FfmpegRunner::new();
    let mut segments = Vec::with_capacity(allotments.len());
    for (seq, (clip_index, allotted)) in allotments.iter().enumerate() {
        let segment = segment_dir.join(format!("seg-{:03}.mp4", seq));
        debug!(
            "Preparing segment {} from {} ({:.2}s)",
            seq,
            usable[*clip_index].display(),
            allotted
        );

        let cmd = FfmpegCommand::new(&usable[*clip_index], &segment)
            .no_audio()
            .duration(*allotted)
            .video_filter(normalize_filter(width, height))
            .video_codec("libx264")
            .output_args(["-preset", "veryfast", "-pix_fmt", "yuv420p"])
            .frame_rate(OUTPUT_FPS)
            .threads(req.threads);
        runner.run(&cmd).await?;
        segments.push(segment);
    }

    let list_path = segment_dir.join("concat.txt");
    tokio::fs::write(&list_path, concat_list(&segments)).await?;

    let concat = FfmpegCommand::new(&list_path, &req.output)
        .input_arg("-f")
        .input_arg("concat")
        .input_arg("-safe")
        .input_arg("0")
        .output_args(["-c", "copy"]);
    runner.run(&concat).await?;

    let _ = tokio::fs::remove_dir_all(&segment_dir).await;

    info!(
        "Combined {} segments into {}",
        segments.len(),
        req.output.display()
    );
    Ok(req.output.clone())
}

/// Render the final artifact: subtitles burned in, narration mixed
/// with optional background music.
///
/// Bgm is best-effort: if the bgm render fails the artifact is
/// re-rendered narration-only and the failure is logged, not
/// propagated.
pub async fn generate_video(req: &RenderRequest) -> MediaResult<PathBuf> {
    let info = probe_video(&req.video).await?;

    let overlays = subtitle_overlays(req, info.width, info.height)?;

    match render(req, &overlays, req.bgm_file.as_deref(), info.duration).await {
        Ok(()) => {}
        Err(e) if req.bgm_file.is_some() => {
            warn!("Bgm mix failed, rendering narration-only: {}", e);
            render(req, &overlays, None, info.duration).await?;
        }
        Err(e) => return Err(e),
    }

    info!("Rendered final video: {}", req.output.display());
    Ok(req.output.clone())
}

async fn render(
    req: &RenderRequest,
    overlays: &[String],
    bgm: Option<&Path>,
    video_duration: f64,
) -> MediaResult<()> {
    let mut cmd = FfmpegCommand::new(&req.video, &req.output).input(&req.audio);

    if let Some(bgm) = bgm {
        cmd = cmd
            .input(bgm)
            .input_arg("-stream_loop")
            .input_arg("-1")
            .filter_complex(voice_bgm_filter(
                req.params.voice_volume,
                req.params.bgm_volume,
                video_duration,
            ));
    } else {
        cmd = cmd.filter_complex(voice_filter(req.params.voice_volume));
    }

    if !overlays.is_empty() {
        cmd = cmd.video_filter(overlays.join(","));
    }

    let cmd = cmd
        .output_args(["-map", "0:v", "-map", "[aout]"])
        .video_codec("libx264")
        .output_args(["-preset", "veryfast", "-pix_fmt", "yuv420p"])
        .audio_codec("aac")
        .frame_rate(OUTPUT_FPS)
        .threads(req.params.threads);

    FfmpegRunner::new().run(&cmd).await
}

/// Build one drawtext overlay per wrapped subtitle line.
fn subtitle_overlays(req: &RenderRequest, width: u32, height: u32) -> MediaResult<Vec<String>> {
    if !req.params.subtitle_enabled || req.subtitles.is_empty() {
        return Ok(Vec::new());
    }

    let font_file = match &req.font_file {
        Some(path) => path,
        None => {
            warn!("Subtitles enabled but no font file resolved; skipping overlay");
            return Ok(Vec::new());
        }
    };

    let mut measurer = FontMeasurer::from_font_file(font_file, req.params.font_size as f32)?;
    let max_width = width as f32 * 0.9;
    let font_path = font_file.to_string_lossy();

    let mut overlays = Vec::new();
    for cue in &req.subtitles {
        let wrapped = wrap(&cue.text, max_width, &mut measurer);
        if wrapped.lines.is_empty() {
            continue;
        }

        let line_height = measurer.line_height() as f64;
        let y_base = subtitle_y(req.params.subtitle_position, height, wrapped.height_px);

        for (i, line) in wrapped.lines.iter().enumerate() {
            overlays.push(drawtext_filter(
                &font_path,
                line,
                req.params.font_size,
                &req.params.text_color,
                &req.params.stroke_color,
                req.params.stroke_width,
                y_base + i as f64 * line_height,
                cue.start,
                cue.end,
            ));
        }
    }

    Ok(overlays)
}

/// Vertical anchor of a subtitle block.
fn subtitle_y(position: SubtitlePosition, frame_height: u32, text_height: u32) -> f64 {
    let frame_height = frame_height as f64;
    let text_height = text_height as f64;
    match position {
        SubtitlePosition::Bottom => frame_height * 0.95 - text_height,
        SubtitlePosition::Top => frame_height * 0.10,
        SubtitlePosition::Center => (frame_height - text_height) / 2.0,
    }
}

/// Walk clips in order, capping each at `max_clip` and trimming the
/// last accepted clip to the remaining budget. Returns `(input index,
/// allotted seconds)` for each included clip.
fn plan_allotments(durations: &[f64], max_clip: f64, budget: f64) -> Vec<(usize, f64)> {
    let mut allotments = Vec::new();
    let mut total = 0.0;

    for (index, &duration) in durations.iter().enumerate() {
        let remaining = budget - total;
        if remaining <= f64::EPSILON {
            break;
        }

        let allotted = duration.min(max_clip);
        if allotted <= 0.0 {
            continue;
        }

        if allotted >= remaining {
            allotments.push((index, remaining));
            break;
        }

        total += allotted;
        allotments.push((index, allotted));
    }

    allotments
}

fn segment_dir_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "combined".to_string());
    output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}-segments", stem))
}

/// Concat demuxer list, quoting paths for its parser.
fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}
