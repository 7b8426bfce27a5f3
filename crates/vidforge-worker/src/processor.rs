//! Per-job generation pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use vidforge_models::{GenerateVideoJob, NotificationUpdate, StoredMedia};
use vidforge_notify::{EventChannel, NotificationStore, NotifyError};
use vidforge_providers::{GenerationRequest, ProviderRegistry};
use vidforge_queue::{ClaimedJob, JobQueue};
use vidforge_storage::MediaStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// Shared resources for job processing, built once per worker.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub queue: Arc<JobQueue>,
    pub registry: ProviderRegistry,
    pub media: MediaStore,
    pub notifications: NotificationStore,
    pub events: EventChannel,
}

impl ProcessingContext {
    /// Build the context from environment configuration.
    pub async fn new(config: WorkerConfig, queue: Arc<JobQueue>) -> WorkerResult<Self> {
        let registry = ProviderRegistry::from_env()?;
        let media = MediaStore::from_env().await?;
        let notifications = NotificationStore::from_env()?;
        let events = EventChannel::from_env()?;

        Ok(Self {
            config,
            queue,
            registry,
            media,
            notifications,
            events,
        })
    }
}

/// Run one generation attempt: provider call, then persistence.
///
/// Notification and event updates along the way are best-effort; only
/// provider and persistence outcomes decide the job's fate. The caller
/// resolves the claim (complete / retry / dead-letter) from the result.
pub async fn generate(ctx: &ProcessingContext, claimed: &ClaimedJob) -> WorkerResult<StoredMedia> {
    let job = &claimed.job;
    info!(
        job_id = %job.job_id,
        provider = %job.provider,
        attempt = claimed.attempt,
        "Starting generation"
    );

    mark_processing(ctx, job).await;
    ctx.events
        .started(&job.owner_user_id, &job.job_id, job.provider)
        .await
        .ok();

    let provider = ctx
        .registry
        .get(job.provider)
        .ok_or(WorkerError::NoAdapter(job.provider))?;

    // Keep the status record fresh while the provider call runs so the
    // API does not report the job as stale.
    let heartbeat = spawn_heartbeat(ctx, job);

    let mut request = GenerationRequest::new(&job.prompt).with_options(job.options.clone());
    if let Some(url) = &job.source_media_url {
        request = request.with_source_media(url);
    }

    let started = Instant::now();
    let output = provider.generate(&request).await;
    metrics::record_generation_duration(job.provider.as_str(), started.elapsed().as_secs_f64());
    heartbeat.abort();

    let output = output?;
    info!(
        job_id = %job.job_id,
        "Provider returned output, persisting"
    );

    let persist_started = Instant::now();
    let stored = ctx
        .media
        .store(
            &job.owner_user_id,
            &job.prompt,
            job.provider,
            &output.video_url,
            output.thumbnail_url.clone(),
        )
        .await
        .map_err(|e| {
            // The generated video exists at the provider but was never
            // re-hosted; record its URL so an operator can recover it.
            error!(
                job_id = %job.job_id,
                orphaned_media_url = %output.video_url,
                "Persistence failed after successful generation: {}",
                e
            );
            WorkerError::Storage(e)
        })?;
    metrics::record_persist_duration(persist_started.elapsed().as_secs_f64());

    Ok(stored)
}

/// Resolve a successfully generated job: ack, notification, event.
pub async fn resolve_success(ctx: &ProcessingContext, claimed: &ClaimedJob, media: &StoredMedia) {
    let job = &claimed.job;

    if let Err(e) = ctx
        .queue
        .complete(&claimed.message_id, job, &media.id, &media.url)
        .await
    {
        error!(job_id = %job.job_id, "Failed to ack completed job: {}", e);
    }

    if let Some(notification_id) = &job.notification_id {
        let update = NotificationUpdate::completed(media.id.clone(), media.thumbnail_url.clone());
        if let Err(e) = ctx.notifications.transition(notification_id, update).await {
            log_notify_error(job, &e);
        }
    }

    ctx.events
        .completed(
            &job.owner_user_id,
            &job.job_id,
            &media.id,
            &media.url,
            job.provider,
        )
        .await
        .ok();

    metrics::record_job_completed(job.provider.as_str());
    info!(job_id = %job.job_id, media_id = %media.id, "Job completed");
}

/// Resolve a terminally failed job: DLQ, notification, event.
pub async fn resolve_failure(
    ctx: &ProcessingContext,
    claimed: &ClaimedJob,
    error_message: &str,
    reason: &str,
) {
    let job = &claimed.job;

    if let Err(e) = ctx
        .queue
        .dead_letter(&claimed.message_id, job, error_message)
        .await
    {
        error!(job_id = %job.job_id, "Failed to dead-letter job: {}", e);
    }

    if let Some(notification_id) = &job.notification_id {
        let update = NotificationUpdate::failed(error_message);
        if let Err(e) = ctx.notifications.transition(notification_id, update).await {
            log_notify_error(job, &e);
        }
    }

    ctx.events
        .failed(&job.owner_user_id, &job.job_id, error_message, job.provider)
        .await
        .ok();

    metrics::record_job_failed(job.provider.as_str(), reason);
    warn!(job_id = %job.job_id, "Job dead-lettered: {}", error_message);
}

/// Best-effort transition of the notification to PROCESSING.
async fn mark_processing(ctx: &ProcessingContext, job: &GenerateVideoJob) {
    if let Some(notification_id) = &job.notification_id {
        match ctx
            .notifications
            .transition(notification_id, NotificationUpdate::processing())
            .await
        {
            Ok(_) => {}
            // Redelivered jobs are already past PROCESSING
            Err(NotifyError::InvalidTransition(e)) => {
                debug!(job_id = %job.job_id, "Skipping notification update: {}", e);
            }
            Err(e) => log_notify_error(job, &e),
        }
    }
}

fn spawn_heartbeat(ctx: &ProcessingContext, job: &GenerateVideoJob) -> tokio::task::JoinHandle<()> {
    let queue = Arc::clone(&ctx.queue);
    let job_id = job.job_id.clone();
    let interval = ctx.config.heartbeat_interval;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // immediate first tick
        loop {
            ticker.tick().await;
            if let Err(e) = queue.heartbeat(&job_id).await {
                warn!(job_id = %job_id, "Heartbeat failed: {}", e);
            }
        }
    })
}

fn log_notify_error(job: &GenerateVideoJob, e: &NotifyError) {
    warn!(job_id = %job.job_id, "Notification update failed: {}", e);
}
