//! Notification lookup.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use vidforge_models::{GenerationNotification, NotificationId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub user_id: String,
}

/// `GET /api/notifications/:notification_id?userId=...`
///
/// Owner-scoped: a notification belonging to another user reads as
/// missing rather than forbidden.
pub async fn get_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<NotificationId>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<GenerationNotification>> {
    let notification = state
        .notifications
        .get(&notification_id)
        .await?
        .filter(|n| n.owner_user_id == query.user_id)
        .ok_or_else(|| ApiError::not_found(format!("Notification {}", notification_id)))?;

    Ok(Json(notification))
}
