//! Job status polling.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use vidforge_models::{JobId, JobState, MediaId};
use vidforge_queue::{STALE_GRACE_PERIOD_SECS, STALE_THRESHOLD_SECS};

use crate::error::ApiResult;
use crate::state::AppState;

/// Job status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub media_id: MediaId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

/// `GET /api/jobs/:job_id`
///
/// Unknown jobs answer 200 with `"not_found"` rather than 404: polling
/// clients race enqueue and record expiry, and neither is an error.
/// Active jobs whose worker heartbeat has gone quiet report `"stale"`.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> ApiResult<Json<JobStatusResponse>> {
    let record = match state.queue.get_status(&job_id).await? {
        Some(record) => record,
        None => {
            return Ok(Json(JobStatusResponse {
                status: "not_found".to_string(),
                attempts: None,
                result: None,
                error: None,
            }));
        }
    };

    let status = if record.is_stale(STALE_THRESHOLD_SECS, STALE_GRACE_PERIOD_SECS) {
        "stale".to_string()
    } else {
        record.state.as_str().to_string()
    };

    let result = match record.state {
        JobState::Completed => record.result_media_id.map(|media_id| JobResult {
            media_id,
            media_url: record.result_media_url,
        }),
        _ => None,
    };

    Ok(Json(JobStatusResponse {
        status,
        attempts: Some(record.attempt_count),
        result,
        error: record.error_message,
    }))
}
