//! FFmpeg filter builders.

/// Normalize a clip to the target resolution.
///
/// Uniform scale so the clip fits inside the target, then center it
/// over an opaque black canvas. A clip whose aspect already matches the
/// target scales to exactly fill it and the pad is a no-op. `setsar=1`
/// keeps the concat demuxer from rejecting mixed sample aspect ratios.
pub fn normalize_filter(target_width: u32, target_height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1",
        w = target_width,
        h = target_height
    )
}

/// One drawtext overlay for a single wrapped subtitle line.
///
/// The line is horizontally centered; the caller supplies the absolute
/// vertical pixel position and the time window.
#[allow(clippy::too_many_arguments)]
pub fn drawtext_filter(
    font_file: &str,
    text: &str,
    font_size: u32,
    text_color: &str,
    stroke_color: &str,
    stroke_width: f64,
    y_px: f64,
    start: f64,
    end: f64,
) -> String {
    format!(
        "drawtext=fontfile='{}':text='{}':expansion=none:fontsize={}:fontcolor={}:\
         borderw={:.2}:bordercolor={}:x=(w-text_w)/2:y={:.1}:enable='between(t,{:.3},{:.3})'",
        escape_filter_value(font_file),
        escape_filter_value(text),
        font_size,
        text_color,
        stroke_width,
        stroke_color,
        y_px,
        start,
        end,
    )
}

/// Narration-only audio graph.
pub fn voice_filter(voice_volume: f64) -> String {
    format!("[1:a]volume={:.3}[aout]", voice_volume)
}

/// Narration mixed with looped background music.
///
/// The bgm input is expected to be looped at the input stage
/// (`-stream_loop -1`); the fade-out starts three seconds before the
/// video ends and the mix follows the narration stream's length.
pub fn voice_bgm_filter(voice_volume: f64, bgm_volume: f64, video_duration: f64) -> String {
    let fade_start = (video_duration - 3.0).max(0.0);
    format!(
        "[1:a]volume={:.3}[voice];\
         [2:a]volume={:.3},afade=t=out:st={:.3}:d=3[bgm];\
         [voice][bgm]amix=inputs=2:duration=first:dropout_transition=0[aout]",
        voice_volume, bgm_volume, fade_start
    )
}

/// Escape a value embedded in a single-quoted filter argument.
///
/// Inside the quotes only backslash and the quote itself are special
/// to the filtergraph parser; `expansion=none` on drawtext keeps `%`
/// literal.
fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "'\\''")
}
