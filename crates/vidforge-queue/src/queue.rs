//! Job queue using Redis Streams.
//!
//! Jobs ride a stream consumed through a consumer group; group delivery
//! guarantees each message reaches exactly one claimant. A failed job is
//! left pending and redelivered via XCLAIM once its idle time exceeds
//! the claim lease, which doubles as the retry backoff delay.

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use vidforge_models::{GenerateVideoJob, JobId, JobStatusRecord, MediaId};

use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// Total attempt budget per job (first run included)
    pub max_attempts: u32,
    /// TTL for job status records
    pub status_ttl: Duration,
    /// TTL for idempotency dedup keys
    pub dedup_ttl: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "vidforge:jobs".to_string(),
            consumer_group: "vidforge:workers".to_string(),
            dlq_stream_name: "vidforge:dlq".to_string(),
            max_attempts: 3,
            status_ttl: Duration::from_secs(7 * 24 * 3600),
            dedup_ttl: Duration::from_secs(3600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM").unwrap_or(defaults.dlq_stream_name),
            max_attempts: std::env::var("QUEUE_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            status_ttl: Duration::from_secs(
                std::env::var("QUEUE_STATUS_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.status_ttl.as_secs()),
            ),
            dedup_ttl: Duration::from_secs(
                std::env::var("QUEUE_DEDUP_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.dedup_ttl.as_secs()),
            ),
        }
    }
}

/// A claimed job together with its stream message id.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    /// Stream message id, needed to ack/fail the claim
    pub message_id: String,
    pub job: GenerateVideoJob,
    /// Attempt number this claim represents (1-based)
    pub attempt: u32,
}

/// What the worker should do with a failed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Attempt budget remains; the message stays pending and will be
    /// redelivered after the claim lease expires.
    Retry { attempt: u32 },
    /// Budget exhausted; caller must dead-letter the job.
    DeadLetter { attempts: u32 },
}

/// Decide what a failure count means against the attempt budget.
fn disposition_for(failures: u32, max_attempts: u32) -> FailureDisposition {
    if failures >= max_attempts {
        FailureDisposition::DeadLetter { attempts: failures }
    } else {
        FailureDisposition::Retry { attempt: failures }
    }
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    "Consumer group already exists: {}",
                    self.config.consumer_group
                );
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a job: durably stores the payload and a `queued` status
    /// record, rejecting duplicates by idempotency key.
    pub async fn enqueue(&self, job: &GenerateVideoJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        let idempotency_key = job.idempotency_key();

        let dedup_key = self.dedup_key(&idempotency_key);
        let exists: bool = conn.exists(&dedup_key).await?;
        if exists {
            warn!("Duplicate job rejected: {}", idempotency_key);
            return Err(QueueError::enqueue_failed("Duplicate job"));
        }

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&idempotency_key)
            .query_async(&mut conn)
            .await?;

        conn.set_ex::<_, _, ()>(&dedup_key, "1", self.config.dedup_ttl.as_secs())
            .await?;

        let record =
            JobStatusRecord::queued(job.job_id.as_str(), &job.owner_user_id, job.provider);
        self.put_status(&mut conn, &record).await?;

        info!(
            "Enqueued job {} for {} with message ID {}",
            job.job_id, job.provider, message_id
        );

        Ok(message_id)
    }

    /// Claim up to `count` queued jobs for this consumer.
    ///
    /// Consumer-group delivery guarantees no other claimant receives the
    /// same message; each claim marks the job active and bumps its
    /// attempt counter.
    pub async fn claim(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<ClaimedJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">") // Only new messages
            .query_async(&mut conn)
            .await?;

        let mut claimed = Vec::new();

        for stream_key in result.keys {
            for entry in stream_key.ids {
                if let Some(job) = self.parse_entry(&mut conn, &entry).await? {
                    let attempt = self.mark_claimed(&mut conn, &job).await?;
                    debug!("Claimed job {} (attempt {})", job.job_id, attempt);
                    claimed.push(ClaimedJob {
                        message_id: entry.id.clone(),
                        job,
                        attempt,
                    });
                }
            }
        }

        Ok(claimed)
    }

    /// Reclaim pending jobs whose claim lease has expired.
    ///
    /// Covers both crashed workers and retryable failures: either way
    /// the message sits pending until its idle time exceeds
    /// `min_idle`, then transfers to this consumer as a fresh attempt.
    pub async fn claim_stalled(
        &self,
        consumer_name: &str,
        min_idle: Duration,
        count: usize,
    ) -> QueueResult<Vec<ClaimedJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // XPENDING with the IDLE filter lists eligible entries along
        // with their delivery counts; XCLAIM then takes those explicit
        // ids (it does not accept a range).
        let pending: redis::streams::StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("IDLE")
            .arg(min_idle.as_millis() as u64)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        if pending.ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut deliveries = std::collections::HashMap::new();
        let mut claim = redis::cmd("XCLAIM");
        claim
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle.as_millis() as u64);
        for entry in &pending.ids {
            deliveries.insert(entry.id.clone(), entry.times_delivered);
            claim.arg(&entry.id);
        }

        let result: redis::streams::StreamClaimReply = claim.query_async(&mut conn).await?;

        let mut claimed = Vec::new();

        for entry in result.ids {
            if let Some(job) = self.parse_entry(&mut conn, &entry).await? {
                let attempt = self.mark_claimed(&mut conn, &job).await?;
                // A crash-looping worker never reaches fail(), so the
                // stream's delivery count backstops the attempt budget.
                let attempt =
                    attempt.max(deliveries.get(&entry.id).copied().unwrap_or(0) as u32);
                info!("Reclaimed stalled job {} (attempt {})", job.job_id, attempt);
                claimed.push(ClaimedJob {
                    message_id: entry.id.clone(),
                    job,
                    attempt,
                });
            }
        }

        Ok(claimed)
    }

    /// Terminal success: ack the message and write the completed record.
    pub async fn complete(
        &self,
        message_id: &str,
        job: &GenerateVideoJob,
        media_id: &MediaId,
        media_url: &str,
    ) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        self.ack(&mut conn, message_id).await?;

        if let Some(mut record) = self.fetch_status(&mut conn, &job.job_id).await? {
            record.complete(media_id.clone(), media_url);
            self.put_status(&mut conn, &record).await?;
        }

        let _: () = conn.del(self.retry_key(message_id)).await?;
        let _: () = conn.del(self.dedup_key(&job.idempotency_key())).await?;

        info!("Completed job {}", job.job_id);
        Ok(())
    }

    /// Record a failed attempt and decide what happens next.
    ///
    /// The retry/dead-letter policy decision belongs to the caller; this
    /// only accounts attempts. On `Retry` the message stays pending for
    /// later reclamation and the status record drops back to `queued`.
    pub async fn fail(
        &self,
        message_id: &str,
        job: &GenerateVideoJob,
    ) -> QueueResult<FailureDisposition> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let retry_key = self.retry_key(message_id);
        let failures: u32 = conn.incr(&retry_key, 1).await?;
        let _: () = conn.expire(&retry_key, 86400).await?;

        let disposition = disposition_for(failures, self.config.max_attempts);
        if matches!(disposition, FailureDisposition::Retry { .. }) {
            if let Some(mut record) = self.fetch_status(&mut conn, &job.job_id).await? {
                record.requeue();
                self.put_status(&mut conn, &record).await?;
            }
        }
        Ok(disposition)
    }

    /// Move a job to the dead letter stream and mark it terminally failed.
    pub async fn dead_letter(
        &self,
        message_id: &str,
        job: &GenerateVideoJob,
        error: &str,
    ) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(&mut conn, message_id).await?;

        if let Some(mut record) = self.fetch_status(&mut conn, &job.job_id).await? {
            record.fail(error);
            self.put_status(&mut conn, &record).await?;
        }

        let _: () = conn.del(self.retry_key(message_id)).await?;
        let _: () = conn.del(self.dedup_key(&job.idempotency_key())).await?;

        warn!("Moved job {} to DLQ: {}", job.job_id, error);
        Ok(())
    }

    /// Non-blocking status read; `None` means unknown or purged.
    pub async fn get_status(&self, job_id: &JobId) -> QueueResult<Option<JobStatusRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.fetch_status(&mut conn, job_id).await
    }

    /// Refresh the worker heartbeat on an active job's status record.
    pub async fn heartbeat(&self, job_id: &JobId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        if let Some(mut record) = self.fetch_status(&mut conn, job_id).await? {
            record.record_heartbeat();
            self.put_status(&mut conn, &record).await?;
        }
        Ok(())
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Get DLQ length.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.dlq_stream_name).await?;
        Ok(len)
    }

    async fn ack(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        message_id: &str,
    ) -> QueueResult<()> {
        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(conn)
            .await?;

        debug!("Acknowledged message: {}", message_id);
        Ok(())
    }

    async fn parse_entry(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        entry: &redis::streams::StreamId,
    ) -> QueueResult<Option<GenerateVideoJob>> {
        if let Some(redis::Value::BulkString(payload)) = entry.map.get("job") {
            let payload_str = String::from_utf8_lossy(payload);
            match serde_json::from_str::<GenerateVideoJob>(&payload_str) {
                Ok(job) => return Ok(Some(job)),
                Err(e) => {
                    warn!("Failed to parse job payload, dropping message: {}", e);
                    self.ack(conn, &entry.id).await.ok();
                }
            }
        }
        Ok(None)
    }

    async fn mark_claimed(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        job: &GenerateVideoJob,
    ) -> QueueResult<u32> {
        let mut record = match self.fetch_status(conn, &job.job_id).await? {
            Some(r) => r,
            // Status record purged under a live message; rebuild it.
            None => JobStatusRecord::queued(job.job_id.as_str(), &job.owner_user_id, job.provider),
        };
        record.claim();
        self.put_status(conn, &record).await?;
        Ok(record.attempt_count)
    }

    async fn fetch_status(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        job_id: &JobId,
    ) -> QueueResult<Option<JobStatusRecord>> {
        let raw: Option<String> = conn.get(self.status_key(job_id.as_str())).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    async fn put_status(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        record: &JobStatusRecord,
    ) -> QueueResult<()> {
        let payload = serde_json::to_string(record)?;
        conn.set_ex::<_, _, ()>(
            self.status_key(&record.job_id),
            payload,
            self.config.status_ttl.as_secs(),
        )
        .await?;
        Ok(())
    }

    fn status_key(&self, job_id: &str) -> String {
        format!("vidforge:status:{}", job_id)
    }

    fn retry_key(&self, message_id: &str) -> String {
        format!("vidforge:retry:{}", message_id)
    }

    fn dedup_key(&self, idempotency_key: &str) -> String {
        format!("vidforge:dedup:{}", idempotency_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.stream_name, "vidforge:jobs");
    }

    #[test]
    fn test_failure_disposition_boundary() {
        // With a budget of 3, the first two failures retry and the
        // third dead-letters.
        assert_eq!(
            disposition_for(1, 3),
            FailureDisposition::Retry { attempt: 1 }
        );
        assert_eq!(
            disposition_for(2, 3),
            FailureDisposition::Retry { attempt: 2 }
        );
        assert_eq!(
            disposition_for(3, 3),
            FailureDisposition::DeadLetter { attempts: 3 }
        );
        // A crash loop can push the count past the budget.
        assert_eq!(
            disposition_for(4, 3),
            FailureDisposition::DeadLetter { attempts: 4 }
        );
    }
}
