//! Video generation producer endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vidforge_models::{
    GenerateVideoJob, GenerationNotification, JobId, NotificationId, ProviderKind, ProviderOptions,
    StoredMedia,
};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Generation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub provider_type: ProviderKind,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub source_media_url: Option<String>,
    #[serde(default)]
    pub owner_user_id: Option<String>,
    /// Client-supplied correlation id; one is minted when absent.
    #[serde(default)]
    pub notification_id: Option<NotificationId>,
    #[serde(default)]
    pub provider_options: Option<ProviderOptions>,
}

/// Accepted response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: JobId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<NotificationId>,
}

/// `POST /api/generate`
///
/// Validates the request, records a REQUESTED notification, enqueues the
/// job, and answers 202 immediately. Validation failure creates nothing
/// and lists the missing parameters; a notification store failure is
/// logged but does not block the job.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let mut job = GenerateVideoJob::new(
        request.provider_type,
        request.prompt.unwrap_or_default(),
        request.owner_user_id.unwrap_or_default(),
    );
    if let Some(url) = request.source_media_url {
        job = job.with_source_media(url);
    }
    if let Some(options) = request.provider_options {
        job = job.with_options(options);
    }

    if let Err(missing) = job.validate() {
        return Err(ApiError::MissingParams(missing));
    }

    // A supplied correlation id rides the job untouched; otherwise a
    // fresh notification record is created best-effort, and the job
    // proceeds without one if the store is down.
    let notification_id = match request.notification_id {
        Some(id) => {
            job = job.with_notification(id.clone());
            Some(id)
        }
        None => {
            let notification = GenerationNotification::new(
                &job.owner_user_id,
                StoredMedia::name_from_prompt(&job.prompt),
            );
            match state.notifications.create(&notification).await {
                Ok(()) => {
                    job = job.with_notification(notification.id.clone());
                    Some(notification.id)
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, "Failed to create notification: {}", e);
                    None
                }
            }
        }
    };

    state.queue.enqueue(&job).await?;
    metrics::record_job_enqueued(job.provider.as_str());

    info!(
        job_id = %job.job_id,
        provider = %job.provider,
        user = %job.owner_user_id,
        "Generation job enqueued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            job_id: job.job_id,
            status: "queued",
            notification_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_maps_to_job() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{
                "providerType": "runway",
                "prompt": "a koi pond at dawn",
                "ownerUserId": "user-1",
                "providerOptions": { "duration_secs": 5 }
            }"#,
        )
        .unwrap();

        let job = GenerateVideoJob::new(
            request.provider_type,
            request.prompt.unwrap_or_default(),
            request.owner_user_id.unwrap_or_default(),
        )
        .with_options(request.provider_options.unwrap_or_default());

        assert_eq!(job.provider, ProviderKind::Runway);
        assert_eq!(job.prompt, "a koi pond at dawn");
        assert_eq!(job.options.duration_secs, Some(5));
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_supplied_notification_id_rides_the_job() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{
                "providerType": "luma",
                "prompt": "waves",
                "ownerUserId": "user-1",
                "notificationId": "notif-abc"
            }"#,
        )
        .unwrap();

        let id = request.notification_id.clone().unwrap();
        let job = GenerateVideoJob::new(
            request.provider_type,
            request.prompt.unwrap_or_default(),
            request.owner_user_id.unwrap_or_default(),
        )
        .with_notification(id.clone());

        assert_eq!(id.as_str(), "notif-abc");
        assert_eq!(job.notification_id, Some(id));
    }

    #[test]
    fn test_empty_request_lists_missing_params() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"providerType": "kling"}"#).unwrap();

        let job = GenerateVideoJob::new(
            request.provider_type,
            request.prompt.unwrap_or_default(),
            request.owner_user_id.unwrap_or_default(),
        );

        let missing = job.validate().unwrap_err();
        assert!(missing.contains(&"ownerUserId"));
        assert!(missing.contains(&"prompt"));
        assert!(missing.contains(&"sourceMediaUrl"));
    }
}
