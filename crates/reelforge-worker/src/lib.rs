//! Task pipeline orchestrator.
//!
//! This crate provides:
//! - The multi-stage state machine driving one task from script to
//!   rendered variants, with progress checkpoints and provider fallback
//! - Materials gathering across search terms with global dedup
//! - A semaphore-bounded executor running tasks as independent workers
//! - Worker configuration and logging setup

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod materials;
pub mod pipeline;
pub mod progress;
pub mod retry;

pub use config::WorkerConfig;
pub use context::{ClipFetcher, Compositor, FfmpegCompositor, PipelineContext, Transcriber};
pub use error::{WorkerError, WorkerResult};
pub use executor::TaskExecutor;
pub use logging::{init_tracing, TaskLogger};
pub use pipeline::run_task;
pub use progress::ProgressReporter;

/// Process startup for embedding binaries: load `.env`, initialize
/// tracing, read the worker config.
pub fn bootstrap() -> WorkerConfig {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    WorkerConfig::from_env()
}
