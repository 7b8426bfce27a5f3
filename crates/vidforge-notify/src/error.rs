//! Notification error types.

use thiserror::Error;
use vidforge_models::{InvalidTransition, NotificationId};

/// Errors from the notification store and event channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;
