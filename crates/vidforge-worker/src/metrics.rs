//! Worker metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_COMPLETED_TOTAL: &str = "vidforge_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vidforge_jobs_failed_total";
    pub const JOBS_RETRIED_TOTAL: &str = "vidforge_jobs_retried_total";
    pub const GENERATION_DURATION_SECONDS: &str = "vidforge_generation_duration_seconds";
    pub const PERSIST_DURATION_SECONDS: &str = "vidforge_persist_duration_seconds";
}

/// Record a completed job.
pub fn record_job_completed(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record a dead-lettered job.
pub fn record_job_failed(provider: &str, reason: &str) {
    let labels = [
        ("provider", provider.to_string()),
        ("reason", reason.to_string()),
    ];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record a retry.
pub fn record_job_retried(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::JOBS_RETRIED_TOTAL, &labels).increment(1);
}

/// Record how long the provider call took.
pub fn record_generation_duration(provider: &str, duration_secs: f64) {
    let labels = [("provider", provider.to_string())];
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record how long persistence took.
pub fn record_persist_duration(duration_secs: f64) {
    histogram!(names::PERSIST_DURATION_SECONDS).record(duration_secs);
}
