//! Structured task logging.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelforge_models::TaskId;

/// Initialize tracing once per process.
///
/// Colored output for development, JSON when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reelforge=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Task logger with consistent contextual fields.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
    stage: String,
}

impl TaskLogger {
    /// Create a logger for a task and pipeline stage.
    pub fn new(task_id: &TaskId, stage: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Log the start of a stage.
    pub fn log_start(&self, message: &str) {
        info!(task_id = %self.task_id, stage = %self.stage, "Stage started: {}", message);
    }

    /// Log a warning during a stage.
    pub fn log_warning(&self, message: &str) {
        warn!(task_id = %self.task_id, stage = %self.stage, "Stage warning: {}", message);
    }

    /// Log an error during a stage.
    pub fn log_error(&self, message: &str) {
        error!(task_id = %self.task_id, stage = %self.stage, "Stage error: {}", message);
    }

    /// Log the completion of a stage.
    pub fn log_completion(&self, message: &str) {
        info!(task_id = %self.task_id, stage = %self.stage, "Stage completed: {}", message);
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_logger_fields() {
        let id = TaskId::new();
        let logger = TaskLogger::new(&id, "materials");
        assert_eq!(logger.task_id(), id.to_string());
    }
}
