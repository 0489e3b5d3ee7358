//! Task store abstraction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reelforge_models::{TaskId, TaskRecord};

use crate::error::StoreResult;

/// Store the orchestrator persists task records through.
///
/// Injected so tests can substitute a fake; the orchestrator is the only
/// writer, external callers read via `get`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &TaskId) -> StoreResult<Option<TaskRecord>>;

    /// Insert or replace a record.
    async fn upsert(&self, record: TaskRecord) -> StoreResult<()>;
}

/// In-memory task store backed by an RwLock'd map.
#[derive(Debug, Default, Clone)]
pub struct MemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get(&self, id: &TaskId) -> StoreResult<Option<TaskRecord>> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn upsert(&self, record: TaskRecord) -> StoreResult<()> {
        self.tasks.write().await.insert(record.id.clone(), record);
        Ok(())
    }
}
