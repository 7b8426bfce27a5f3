//! Redis Streams job queue.
//!
//! This crate provides:
//! - Durable job enqueueing via Redis Streams
//! - Claim-based consumption through a consumer group (one claimant
//!   per message, the pipeline's mutual-exclusion point)
//! - Retry accounting with a dead-letter stream
//! - A per-job status record for polling queries

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{ClaimedJob, FailureDisposition, JobQueue, QueueConfig};

/// Heartbeats older than this mark an active job stale.
pub const STALE_THRESHOLD_SECS: i64 = 90;

/// Active jobs that never heartbeat are stale after this grace period.
pub const STALE_GRACE_PERIOD_SECS: i64 = 180;
