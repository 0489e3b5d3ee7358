//! Background music selection.

use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use tracing::warn;

use reelforge_models::BgmType;

/// Resolve the background music selection to a file, if any.
///
/// `Random` picks an `*.mp3` from the songs directory; an explicit file
/// that does not exist degrades to no music (bgm is best-effort).
pub fn pick_bgm(bgm_type: &BgmType, songs_dir: impl AsRef<Path>) -> Option<PathBuf> {
    match bgm_type {
        BgmType::Off => None,
        BgmType::File(path) => {
            let path = PathBuf::from(path);
            if path.is_file() {
                Some(path)
            } else {
                warn!("Configured bgm file does not exist: {}", path.display());
                None
            }
        }
        BgmType::Random => {
            let mut songs: Vec<PathBuf> = std::fs::read_dir(songs_dir.as_ref())
                .ok()?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().map(|e| e == "mp3").unwrap_or(false))
                .collect();
            songs.sort();

            if songs.is_empty() {
                warn!("No mp3 files in songs dir: {}", songs_dir.as_ref().display());
                return None;
            }
            songs.choose(&mut rand::rng()).cloned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_is_none() {
        assert!(pick_bgm(&BgmType::Off, "/nonexistent").is_none());
    }

    #[test]
    fn test_missing_explicit_file_degrades() {
        assert!(pick_bgm(&BgmType::File("/no/such/file.mp3".into()), "/tmp").is_none());
    }

    #[test]
    fn test_random_picks_an_mp3() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("b.wav"), b"x").unwrap();

        let picked = pick_bgm(&BgmType::Random, dir.path()).unwrap();
        assert_eq!(picked.extension().unwrap(), "mp3");
    }

    #[test]
    fn test_random_empty_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pick_bgm(&BgmType::Random, dir.path()).is_none());
    }
}
