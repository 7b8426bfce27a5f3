//! Job executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vidforge_queue::{ClaimedJob, FailureDisposition, JobQueue};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::processor::{self, ProcessingContext};

/// Job executor that processes generation jobs from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, queue: JobQueue) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            config,
            queue: Arc::new(queue),
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Start the executor.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        // Initialize queue
        self.queue.init().await?;

        // Create processing context
        let ctx = Arc::new(
            ProcessingContext::new(self.config.clone(), Arc::clone(&self.queue)).await?,
        );

        let mut shutdown_rx = self.shutdown.subscribe();

        // Spawn a task to reclaim stalled jobs periodically. A pending
        // entry older than claim_min_idle belongs to a crashed worker or
        // a failed attempt whose retry lease has expired.
        let queue_clone = Arc::clone(&self.queue);
        let consumer_name = self.consumer_name.clone();
        let ctx_clone = Arc::clone(&ctx);
        let semaphore_clone = Arc::clone(&self.job_semaphore);
        let claim_interval = self.config.claim_interval;
        let claim_min_idle = self.config.claim_min_idle;
        let mut shutdown_rx_claim = self.shutdown.subscribe();

        let claim_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_claim.changed() => {
                        if *shutdown_rx_claim.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue_clone.claim_stalled(&consumer_name, claim_min_idle, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Reclaimed {} stalled jobs", jobs.len());
                                for claimed in jobs {
                                    // Redelivered past the budget without ever
                                    // reaching fail(): a crash-looping job.
                                    if claimed.attempt > queue_clone.max_attempts() {
                                        let message = format!(
                                            "Retry budget exhausted after {} deliveries",
                                            claimed.attempt
                                        );
                                        processor::resolve_failure(
                                            &ctx_clone,
                                            &claimed,
                                            &message,
                                            "retries_exhausted",
                                        )
                                        .await;
                                        continue;
                                    }
                                    let ctx = Arc::clone(&ctx_clone);
                                    let permit = match semaphore_clone.clone().acquire_owned().await {
                                        Ok(p) => p,
                                        Err(_) => break,
                                    };

                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(ctx, claimed).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to reclaim stalled jobs: {}", e);
                            }
                        }
                    }
                }
            }
        });

        // Main job consumption loop
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs(&ctx) => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        // Back off on error
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        // Wait for in-flight jobs to complete
        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Job executor stopped");
        Ok(())
    }

    /// Claim and process new jobs from the queue.
    async fn consume_jobs(&self, ctx: &Arc<ProcessingContext>) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .claim(
                &self.consumer_name,
                1000, // Block for 1 second
                available.min(5),
            )
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Claimed {} jobs from queue", jobs.len());

        for claimed in jobs {
            let ctx = Arc::clone(ctx);
            let permit = self
                .job_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, claimed).await;
            });
        }

        Ok(())
    }

    /// Execute a single claim and resolve it exactly once.
    async fn execute_job(ctx: Arc<ProcessingContext>, claimed: ClaimedJob) {
        let job_id = claimed.job.job_id.clone();

        match processor::generate(&ctx, &claimed).await {
            Ok(media) => {
                processor::resolve_success(&ctx, &claimed, &media).await;
            }
            Err(e) if e.is_retryable() => match ctx.queue.fail(&claimed.message_id, &claimed.job).await {
                Ok(FailureDisposition::Retry { attempt }) => {
                    info!(
                        job_id = %job_id,
                        attempt,
                        max = ctx.queue.max_attempts(),
                        "Transient failure, will retry after claim lease expires: {}",
                        e
                    );
                    metrics::record_job_retried(claimed.job.provider.as_str());
                    // Message stays pending; claim_stalled redelivers it.
                }
                Ok(FailureDisposition::DeadLetter { attempts }) => {
                    let message = format!("Failed after {} attempts: {}", attempts, e);
                    processor::resolve_failure(&ctx, &claimed, &message, "retries_exhausted").await;
                }
                Err(queue_err) => {
                    error!(job_id = %job_id, "Failed to record job failure: {}", queue_err);
                }
            },
            Err(e) => {
                // Permanent: provider rejection, missing adapter, or a
                // persistence failure (already logged with the orphaned
                // URL). Retrying cannot help.
                let reason = match &e {
                    WorkerError::Storage(_) => "persistence",
                    WorkerError::NoAdapter(_) => "no_adapter",
                    _ => "rejected",
                };
                processor::resolve_failure(&ctx, &claimed, &e.to_string(), reason).await;
            }
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            let available = self.job_semaphore.available_permits();
            if available == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
