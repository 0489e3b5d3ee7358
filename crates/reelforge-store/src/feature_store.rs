//! Embedding index over candidate clips.

use std::path::Path;

use tracing::info;

use reelforge_models::FeatureRecord;

use crate::error::{StoreError, StoreResult};

/// Insertion-ordered index of candidate clips and their thumbnail
/// embeddings.
///
/// Population happens before matching starts; at match time the store is
/// read-only, so concurrent readers need no locking (wrap in `Arc` and
/// share). `thumbnail_loc` is the unique key.
#[derive(Debug, Default)]
pub struct FeatureStore {
    records: Vec<FeatureRecord>,
}

impl FeatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Load records from a JSON file (an array of records).
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let records: Vec<FeatureRecord> = serde_json::from_str(&content)?;

        let mut store = Self::new();
        for record in records {
            store.insert(record)?;
        }

        info!("Loaded {} feature records", store.len());
        Ok(store)
    }

    /// Persist all records as a JSON array.
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let content = serde_json::to_string(&self.records)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Append a record. Fails on a duplicate `thumbnail_loc`.
    pub fn insert(&mut self, record: FeatureRecord) -> StoreResult<()> {
        if self.records.iter().any(|r| r.thumbnail_loc == record.thumbnail_loc) {
            return Err(StoreError::DuplicateKey(record.thumbnail_loc));
        }
        self.records.push(record);
        Ok(())
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
