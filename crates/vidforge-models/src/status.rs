//! Job status record for progress tracking and polling.
//!
//! Stored in Redis by the queue so status queries never touch the
//! stream itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::MediaId;
use crate::job::JobState;
use crate::provider::ProviderKind;

/// Cached snapshot of a job's progress, updated by the queue and worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusRecord {
    /// Unique job identifier
    pub job_id: String,
    /// Owning user
    pub owner_user_id: String,
    /// Provider handling the job
    pub provider: ProviderKind,
    /// Current queue state
    pub state: JobState,
    /// Attempts started so far (claims), monotonically increasing
    pub attempt_count: u32,
    /// Error message if the job failed
    pub error_message: Option<String>,
    /// Persisted media id, set only on completion
    pub result_media_id: Option<MediaId>,
    /// Re-hosted media URL, set only on completion
    pub result_media_url: Option<String>,
    /// When the job was enqueued
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
    /// Last heartbeat from the worker processing this job
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl JobStatusRecord {
    /// Create a fresh record for a newly enqueued job.
    pub fn queued(
        job_id: impl Into<String>,
        owner_user_id: impl Into<String>,
        provider: ProviderKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            owner_user_id: owner_user_id.into(),
            provider,
            state: JobState::Queued,
            attempt_count: 0,
            error_message: None,
            result_media_id: None,
            result_media_url: None,
            created_at: now,
            updated_at: now,
            last_heartbeat: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Record a claim: the job goes active and the attempt counter bumps.
    pub fn claim(&mut self) {
        self.state = JobState::Active;
        self.attempt_count += 1;
        self.updated_at = Utc::now();
    }

    /// A retryable failure puts the job back in the queue.
    pub fn requeue(&mut self) {
        self.state = JobState::Queued;
        self.updated_at = Utc::now();
    }

    pub fn record_heartbeat(&mut self) {
        let now = Utc::now();
        self.last_heartbeat = Some(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self, media_id: MediaId, media_url: impl Into<String>) {
        self.state = JobState::Completed;
        self.result_media_id = Some(media_id);
        self.result_media_url = Some(media_url.into());
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = JobState::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Whether the job looks abandoned by its worker.
    ///
    /// A non-terminal job is stale when its last heartbeat is older than
    /// `stale_threshold_secs`, or when it never heartbeat and is older
    /// than `grace_period_secs`.
    pub fn is_stale(&self, stale_threshold_secs: i64, grace_period_secs: i64) -> bool {
        if self.is_terminal() || self.state == JobState::Queued {
            return false;
        }

        let now = Utc::now();
        match self.last_heartbeat {
            Some(hb) => (now - hb).num_seconds() > stale_threshold_secs,
            None => (now - self.created_at).num_seconds() > grace_period_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lifecycle() {
        let mut rec = JobStatusRecord::queued("job-1", "u1", ProviderKind::Kling);
        assert_eq!(rec.state, JobState::Queued);
        assert_eq!(rec.attempt_count, 0);

        rec.claim();
        assert_eq!(rec.state, JobState::Active);
        assert_eq!(rec.attempt_count, 1);

        rec.requeue();
        rec.claim();
        assert_eq!(rec.attempt_count, 2);

        rec.complete(MediaId::from_string("m-1"), "https://cdn/m-1.mp4");
        assert!(rec.is_terminal());
        assert!(rec.result_media_id.is_some());
    }

    #[test]
    fn test_fail_sets_error() {
        let mut rec = JobStatusRecord::queued("job-1", "u1", ProviderKind::Luma);
        rec.claim();
        rec.fail("provider rejected the prompt");
        assert_eq!(rec.state, JobState::Failed);
        assert_eq!(
            rec.error_message.as_deref(),
            Some("provider rejected the prompt")
        );
    }

    #[test]
    fn test_stale_detection() {
        let mut rec = JobStatusRecord::queued("job-1", "u1", ProviderKind::Runway);
        rec.claim();

        // Fresh active job, within grace period
        assert!(!rec.is_stale(60, 120));

        // Old job that never heartbeat
        rec.created_at = Utc::now() - chrono::Duration::seconds(300);
        assert!(rec.is_stale(60, 120));

        // Recent heartbeat clears it
        rec.record_heartbeat();
        assert!(!rec.is_stale(60, 120));
    }

    #[test]
    fn test_queued_and_terminal_never_stale() {
        let mut rec = JobStatusRecord::queued("job-1", "u1", ProviderKind::Runway);
        rec.created_at = Utc::now() - chrono::Duration::seconds(9999);
        assert!(!rec.is_stale(60, 120));

        rec.claim();
        rec.fail("boom");
        assert!(!rec.is_stale(60, 120));
    }
}
