//! Video generation worker.
//!
//! Claims jobs from the queue, drives the provider call, persists the
//! output, and resolves the job exactly once per claim.

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use processor::ProcessingContext;
