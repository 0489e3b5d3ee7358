//! Subtitle cues and SRT parsing.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One timed subtitle cue.
///
/// Cues are used as given: upstream providers guarantee `end > start`,
/// ordering by start, and non-overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleLine {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Cue text (may contain embedded newlines after layout)
    pub text: String,
}

impl SubtitleLine {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Parse SRT content into cues.
///
/// Malformed blocks are skipped rather than failing the whole file; a
/// file that yields zero cues is the caller's signal to discard it.
pub fn parse_srt(content: &str) -> Vec<SubtitleLine> {
    let mut lines = Vec::new();

    for block in content.replace("\r\n", "\n").split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let mut rows = block.lines();
        // First row is the numeric index; tolerate files that omit it.
        let mut timing_row = match rows.next() {
            Some(row) => row.trim(),
            None => continue,
        };
        if timing_row.chars().all(|c| c.is_ascii_digit()) {
            timing_row = match rows.next() {
                Some(row) => row.trim(),
                None => continue,
            };
        }

        let (start, end) = match parse_timing(timing_row) {
            Some(span) => span,
            None => continue,
        };
        if end <= start {
            continue;
        }

        let text = rows.collect::<Vec<_>>().join("\n").trim().to_string();
        if text.is_empty() {
            continue;
        }

        lines.push(SubtitleLine { start, end, text });
    }

    lines
}

/// Render cues as SRT.
pub fn format_srt(lines: &[SubtitleLine]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(line.start),
            format_timestamp(line.end),
            line.text
        );
    }
    out
}

fn parse_timing(row: &str) -> Option<(f64, f64)> {
    let (start, end) = row.split_once("-->")?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end.trim())?))
}

/// Parse `HH:MM:SS,mmm` (comma or dot separator) into seconds.
fn parse_timestamp(ts: &str) -> Option<f64> {
    let ts = ts.replace(',', ".");
    let mut parts = ts.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}
