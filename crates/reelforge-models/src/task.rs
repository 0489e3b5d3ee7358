//! Task records and lifecycle states.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task submitted, not yet picked up by a worker
    #[default]
    Queued,
    /// Pipeline is running
    Processing,
    /// All requested variants rendered
    Complete,
    /// Pipeline hit a fatal error
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Processing => "processing",
            TaskState::Complete => "complete",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Complete | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed reason attached to a failed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureReason {
    /// Script generation produced nothing usable
    Script(String),
    /// Speech synthesis returned no result
    Synthesis(String),
    /// Zero clips could be acquired for any search term
    InsufficientMaterial(String),
    /// A combine/render step failed; names the variant
    Composition(String),
    /// Anything else (IO, serialization)
    Internal(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Script(d) => write!(f, "script generation failed: {}", d),
            FailureReason::Synthesis(d) => write!(f, "speech synthesis failed: {}", d),
            FailureReason::InsufficientMaterial(d) => write!(f, "insufficient material: {}", d),
            FailureReason::Composition(d) => write!(f, "composition failed: {}", d),
            FailureReason::Internal(d) => write!(f, "internal error: {}", d),
        }
    }
}

/// A task owned by the orchestrator.
///
/// External callers observe this record read-only through the task store;
/// only the orchestrator mutates it. `progress` is non-decreasing within a
/// run and a terminal state is entered exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskRecord {
    /// Unique task ID
    pub id: TaskId,

    /// Lifecycle state
    #[serde(default)]
    pub state: TaskState,

    /// Progress 0..=100
    #[serde(default)]
    pub progress: u8,

    /// Final rendered artifacts, in variant order
    #[serde(default)]
    pub videos: Vec<String>,

    /// Intermediate combined clips, in variant order
    #[serde(default)]
    pub combined_videos: Vec<String>,

    /// Failure reason when `state == Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Create a new queued record.
    pub fn new(id: TaskId) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: TaskState::Queued,
            progress: 0,
            videos: Vec::new(),
            combined_videos: Vec::new(),
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_terminal() {
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
        assert!(TaskState::Complete.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn test_task_record_defaults() {
        let record = TaskRecord::new(TaskId::new());
        assert_eq!(record.state, TaskState::Queued);
        assert_eq!(record.progress, 0);
        assert!(record.videos.is_empty());
        assert!(record.failure.is_none());
    }

    #[test]
    fn test_failure_reason_roundtrip() {
        let reason = FailureReason::InsufficientMaterial("no candidates".to_string());
        let json = serde_json::to_string(&reason).unwrap();
        let back: FailureReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reason);
    }
}
