//! Materials gathering across search terms.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{info, warn};

use reelforge_match::select_for_duration;

use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};

/// Match and acquire clips for every search term.
///
/// The total duration target is split evenly across terms. One dedup
/// set spans the whole task, so a clip ranked under several terms is
/// used once. Recoverable acquire failures skip the candidate and let
/// the next-ranked one take its place; only ending up with zero clips
/// overall is fatal.
pub async fn gather_materials(
    ctx: &PipelineContext,
    terms: &[String],
    total_duration: f64,
) -> WorkerResult<Vec<PathBuf>> {
    if terms.is_empty() {
        return Err(WorkerError::insufficient_material("no search terms"));
    }

    let per_term = total_duration / terms.len() as f64;
    let mut seen = HashSet::new();
    let mut acquired = Vec::new();

    for term in terms {
        info!("Gathering material for term '{}'", term);
        let ranked = ctx.matcher.match_phrase(term).await?;
        if ranked.is_empty() {
            warn!("No candidates matched term '{}'", term);
            continue;
        }

        let mut covered = 0.0;
        loop {
            let remaining = per_term - covered;
            if remaining <= 0.0 {
                break;
            }

            // Failed candidates stay in the dedup set, so each round
            // selects strictly deeper into the ranking.
            let selection = select_for_duration(&ranked, remaining, &mut seen);
            if selection.is_empty() {
                break;
            }
            let exhausted = selection.exhausted;

            for clip in &selection.clips {
                match ctx.fetcher.fetch(&clip.content_loc).await {
                    Ok(path) => {
                        covered += clip.duration;
                        acquired.push(path);
                    }
                    Err(e) if e.is_recoverable_acquire() => {
                        warn!("Skipping candidate {}: {}", clip.content_loc, e);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            if exhausted {
                break;
            }
        }
    }

    if acquired.is_empty() {
        return Err(WorkerError::insufficient_material(format!(
            "0 clips acquired across {} terms",
            terms.len()
        )));
    }

    info!("Acquired {} clips", acquired.len());
    Ok(acquired)
}
