//! Task executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info};

use reelforge_models::{TaskId, TaskRecord, VideoParams};

use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::run_task;

/// Runs each submitted task's pipeline on its own tokio task, bounded
/// by a concurrency limit. Tasks share only the feature store (read)
/// and the clip cache; the task store is the single cross-task write
/// path.
pub struct TaskExecutor {
    ctx: Arc<PipelineContext>,
    task_semaphore: Arc<Semaphore>,
    max_concurrent_tasks: usize,
}

impl TaskExecutor {
    /// Create a new executor.
    pub fn new(ctx: Arc<PipelineContext>) -> Self {
        let max_concurrent_tasks = ctx.config.max_concurrent_tasks;
        Self {
            ctx,
            task_semaphore: Arc::new(Semaphore::new(max_concurrent_tasks)),
            max_concurrent_tasks,
        }
    }

    /// Submit a task. Returns its id immediately; the pipeline runs in
    /// the background once a concurrency slot frees up.
    pub async fn submit(&self, params: VideoParams) -> WorkerResult<TaskId> {
        let task_id = TaskId::new();
        self.ctx
            .task_store
            .upsert(TaskRecord::new(task_id.clone()))
            .await?;
        info!("Task {} queued", task_id);

        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.task_semaphore);
        let id = task_id.clone();

        tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("Executor shut down before task {} started", id);
                    return;
                }
            };
            let _permit = permit;

            if let Err(e) = run_task(&ctx, id.clone(), params).await {
                error!("Task {} failed: {}", id, e);
            }
        });

        Ok(task_id)
    }

    /// Wait until every in-flight task finishes, up to `timeout`.
    pub async fn wait_idle(&self, timeout: Duration) -> WorkerResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.task_semaphore.available_permits() == self.max_concurrent_tasks {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(WorkerError::config_error(
                    "timed out waiting for in-flight tasks",
                ));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
