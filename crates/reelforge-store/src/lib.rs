//! Storage for the Reelforge pipeline.
//!
//! This crate provides:
//! - The feature store: an insertion-ordered, append-only embedding index
//!   over candidate clips, read-only at match time
//! - The task store abstraction the orchestrator writes through, with an
//!   in-memory implementation

pub mod error;
pub mod feature_store;
pub mod task_store;

pub use error::{StoreError, StoreResult};
pub use feature_store::FeatureStore;
pub use task_store::{MemoryTaskStore, TaskStore};
