//! Greedy duration-budget clip selection.

use std::collections::HashSet;

use reelforge_models::{ClipSelection, MatchResult, SelectedClip};

/// Fill `target_duration` from a ranked candidate list.
///
/// Walks the ranking top-down, skipping locators already in `seen`
/// (the cross-phrase dedup set for one task), accepting each remaining
/// candidate's full duration until the running total reaches the target
/// or the input runs out. The first accepted candidate may alone exceed
/// the target; it is still taken whole, since trimming is the
/// compositor's job. Partial coverage is reported via `exhausted`, not
/// as an error.
///
/// Accepted locators are added to `seen`.
pub fn select_for_duration(
    ranked: &[MatchResult],
    target_duration: f64,
    seen: &mut HashSet<String>,
) -> ClipSelection {
    let mut clips = Vec::new();
    let mut total = 0.0;

    for candidate in ranked {
        if total >= target_duration {
            return ClipSelection { clips, exhausted: false };
        }
        if candidate.duration <= 0.0 {
            continue;
        }
        if !seen.insert(candidate.content_loc.clone()) {
            continue;
        }

        total += candidate.duration;
        clips.push(SelectedClip {
            content_loc: candidate.content_loc.clone(),
            duration: candidate.duration,
        });
    }

    ClipSelection {
        clips,
        exhausted: total < target_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(items: &[(&str, f64)]) -> Vec<MatchResult> {
        items
            .iter()
            .enumerate()
            .map(|(i, (loc, duration))| MatchResult {
                content_loc: loc.to_string(),
                duration: *duration,
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_fills_to_target() {
        let mut seen = HashSet::new();
        let selection =
            select_for_duration(&ranked(&[("a", 4.0), ("b", 4.0), ("c", 4.0)]), 7.0, &mut seen);

        assert_eq!(selection.clips.len(), 2);
        assert!(!selection.exhausted);
        assert!(selection.total_duration() >= 7.0);
    }

    #[test]
    fn test_partial_coverage_sets_exhausted() {
        let mut seen = HashSet::new();
        let selection = select_for_duration(&ranked(&[("a", 3.0)]), 10.0, &mut seen);

        assert_eq!(selection.clips.len(), 1);
        assert!(selection.exhausted);
    }

    #[test]
    fn test_first_candidate_may_overshoot() {
        let mut seen = HashSet::new();
        let selection = select_for_duration(&ranked(&[("a", 30.0), ("b", 5.0)]), 10.0, &mut seen);

        // Taken whole, no sub-duration trimming here.
        assert_eq!(selection.clips.len(), 1);
        assert!((selection.clips[0].duration - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_dedup_across_phrases() {
        let mut seen = HashSet::new();
        let first = select_for_duration(&ranked(&[("a", 5.0), ("b", 5.0)]), 8.0, &mut seen);
        assert_eq!(first.clips.len(), 2);

        // Second phrase ranks the same clips; both are already used.
        let second = select_for_duration(&ranked(&[("b", 5.0), ("a", 5.0)]), 8.0, &mut seen);
        assert!(second.clips.is_empty());
        assert!(second.exhausted);
    }

    #[test]
    fn test_zero_duration_candidates_skipped() {
        let mut seen = HashSet::new();
        let selection = select_for_duration(&ranked(&[("a", 0.0), ("b", 5.0)]), 4.0, &mut seen);
        assert_eq!(selection.clips.len(), 1);
        assert_eq!(selection.clips[0].content_loc, "b");
    }

    #[test]
    fn test_empty_ranking() {
        let mut seen = HashSet::new();
        let selection = select_for_duration(&[], 4.0, &mut seen);
        assert!(selection.is_empty());
        assert!(selection.exhausted);
    }
}
