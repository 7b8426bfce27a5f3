//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// How often the worker scans for stalled pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be reclaimed.
    /// Doubles as the retry delay: a failed attempt's message stays
    /// pending until this lease expires. Must exceed the provider call
    /// timeout plus persistence time, or a healthy in-flight job gets
    /// reclaimed and run twice.
    pub claim_min_idle: Duration,
    /// Interval for refreshing the job heartbeat while a provider call runs
    pub heartbeat_interval: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(900), // 15 minutes
            heartbeat_interval: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            heartbeat_interval: Duration::from_secs(
                std::env::var("WORKER_HEARTBEAT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.claim_min_idle, Duration::from_secs(900));
    }

    #[test]
    fn test_claim_lease_outlasts_provider_timeout() {
        // A lease shorter than the provider call would reclaim and
        // re-run a job that is still healthily generating.
        let config = WorkerConfig::default();
        let provider_timeout =
            Duration::from_secs(vidforge_providers::adapter::DEFAULT_TIMEOUT_SECS);
        assert!(config.claim_min_idle > provider_timeout);
    }
}
