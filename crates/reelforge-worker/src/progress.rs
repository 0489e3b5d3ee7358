//! Task progress reporting through the task store.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use reelforge_models::{FailureReason, TaskId, TaskRecord, TaskState};
use reelforge_store::TaskStore;

use crate::error::WorkerResult;

/// Single writer for one task's record.
///
/// Progress is clamped to be non-decreasing and no update lands after a
/// terminal state; observers may poll the store at any time.
pub struct ProgressReporter {
    store: Arc<dyn TaskStore>,
    task_id: TaskId,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn TaskStore>, task_id: TaskId) -> Self {
        Self { store, task_id }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Mark the task processing at `progress`.
    pub async fn processing(&self, progress: u8) -> WorkerResult<()> {
        self.update(|record| {
            record.state = TaskState::Processing;
            record.progress = record.progress.max(progress.min(100));
        })
        .await
    }

    /// Terminal success: progress 100 with the artifact paths attached.
    pub async fn complete(
        &self,
        videos: Vec<String>,
        combined_videos: Vec<String>,
    ) -> WorkerResult<()> {
        self.update(|record| {
            record.state = TaskState::Complete;
            record.progress = 100;
            record.videos = videos.clone();
            record.combined_videos = combined_videos.clone();
        })
        .await
    }

    /// Terminal failure with a typed reason. No artifacts are attached.
    pub async fn fail(&self, reason: FailureReason) -> WorkerResult<()> {
        self.update(|record| {
            record.state = TaskState::Failed;
            record.failure = Some(reason.clone());
        })
        .await
    }

    async fn update(&self, apply: impl Fn(&mut TaskRecord)) -> WorkerResult<()> {
        let mut record = self
            .store
            .get(&self.task_id)
            .await?
            .unwrap_or_else(|| TaskRecord::new(self.task_id.clone()));

        if record.state.is_terminal() {
            debug!("Ignoring update for terminal task {}", self.task_id);
            return Ok(());
        }

        apply(&mut record);
        record.updated_at = Utc::now();
        self.store.upsert(record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_store::MemoryTaskStore;

    async fn reporter() -> (ProgressReporter, Arc<MemoryTaskStore>, TaskId) {
        let store = Arc::new(MemoryTaskStore::new());
        let id = TaskId::new();
        store.upsert(TaskRecord::new(id.clone())).await.unwrap();
        (
            ProgressReporter::new(store.clone(), id.clone()),
            store,
            id,
        )
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let (reporter, store, id) = reporter().await;

        reporter.processing(30).await.unwrap();
        reporter.processing(20).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.progress, 30);
        assert_eq!(record.state, TaskState::Processing);
    }

    #[tokio::test]
    async fn test_terminal_state_is_sticky() {
        let (reporter, store, id) = reporter().await;

        reporter
            .fail(FailureReason::Synthesis("no audio".to_string()))
            .await
            .unwrap();
        reporter.processing(90).await.unwrap();
        reporter.complete(vec!["x".into()], vec![]).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.state, TaskState::Failed);
        assert!(record.videos.is_empty());
        assert!(record.failure.is_some());
    }

    #[tokio::test]
    async fn test_complete_attaches_artifacts() {
        let (reporter, store, id) = reporter().await;

        reporter
            .complete(vec!["final-1.mp4".into()], vec!["combined-1.mp4".into()])
            .await
            .unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.state, TaskState::Complete);
        assert_eq!(record.progress, 100);
        assert_eq!(record.videos, vec!["final-1.mp4"]);
    }
}
