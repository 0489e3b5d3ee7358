//! Worker configuration.

use std::path::PathBuf;

use reelforge_providers::SubtitleProviderKind;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrently running tasks
    pub max_concurrent_tasks: usize,
    /// Root directory for per-task working directories
    pub work_dir: PathBuf,
    /// Directory for the content-addressed clip cache
    pub cache_dir: PathBuf,
    /// Directory scanned for random background music
    pub songs_dir: PathBuf,
    /// Directory subtitle fonts are resolved against
    pub font_dir: PathBuf,
    /// Font used when params leave `font_name` empty
    pub default_font: String,
    /// Subtitle provider tried first
    pub subtitle_provider: SubtitleProviderKind,
    /// Search terms requested from the term generator
    pub term_count: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 2,
            work_dir: PathBuf::from("/tmp/reelforge/tasks"),
            cache_dir: PathBuf::from("/tmp/reelforge/cache"),
            songs_dir: PathBuf::from("resource/songs"),
            font_dir: PathBuf::from("resource/fonts"),
            default_font: "STHeitiMedium.ttc".to_string(),
            subtitle_provider: SubtitleProviderKind::TimingAligned,
            term_count: 5,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_tasks: std::env::var("WORKER_MAX_TASKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_tasks),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            cache_dir: std::env::var("WORKER_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            songs_dir: std::env::var("WORKER_SONGS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.songs_dir),
            font_dir: std::env::var("WORKER_FONT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.font_dir),
            default_font: std::env::var("WORKER_DEFAULT_FONT").unwrap_or(defaults.default_font),
            subtitle_provider: std::env::var("SUBTITLE_PROVIDER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.subtitle_provider),
            term_count: std::env::var("WORKER_TERM_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.term_count),
        }
    }

    /// Working directory for one task.
    pub fn task_dir(&self, task_id: &str) -> PathBuf {
        self.work_dir.join(task_id)
    }
}
