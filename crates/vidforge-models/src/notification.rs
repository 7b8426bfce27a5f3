//! User-facing generation notifications.
//!
//! Notifications are decoupled from jobs: the UI can subscribe before a
//! job exists, and failures stay legible after the job itself is purged.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{MediaId, NotificationId};

/// Notification lifecycle status.
///
/// Transitions are monotonic forward only:
/// `Requested -> Processing -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// Accepted, no worker has claimed the job yet
    #[default]
    Requested,
    /// A worker is generating
    Processing,
    /// Generation and persistence succeeded
    Completed,
    /// Generation failed after retries (or persistence failed)
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Requested => "REQUESTED",
            NotificationStatus::Processing => "PROCESSING",
            NotificationStatus::Completed => "COMPLETED",
            NotificationStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationStatus::Completed | NotificationStatus::Failed)
    }

    /// Position in the forward ordering; both terminal states share rank.
    fn rank(&self) -> u8 {
        match self {
            NotificationStatus::Requested => 0,
            NotificationStatus::Processing => 1,
            NotificationStatus::Completed | NotificationStatus::Failed => 2,
        }
    }

    /// Whether moving to `next` preserves monotonic ordering.
    ///
    /// Terminal states absorb: no transition leaves them, including to
    /// the sibling terminal state.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted status change that would move backwards.
#[derive(Debug, Clone, Error)]
#[error("Invalid notification transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: NotificationStatus,
    pub to: NotificationStatus,
}

/// Fields a transition may set alongside the new status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationUpdate {
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_media_id: Option<MediaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl NotificationUpdate {
    pub fn processing() -> Self {
        Self {
            status: NotificationStatus::Processing,
            ..Default::default()
        }
    }

    pub fn completed(media_id: MediaId, thumbnail_url: Option<String>) -> Self {
        Self {
            status: NotificationStatus::Completed,
            result_media_id: Some(media_id),
            thumbnail_url,
            media_count: Some(1),
            error_message: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: NotificationStatus::Failed,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }
}

/// A user-visible progress/result record for one generation request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationNotification {
    pub id: NotificationId,
    pub owner_user_id: String,
    /// Display title, typically derived from the prompt
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_count: Option<u32>,
    pub status: NotificationStatus,
    /// Set only when status is Completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_media_id: Option<MediaId>,
    /// Set only when status is Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationNotification {
    pub fn new(owner_user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NotificationId::new(),
            owner_user_id: owner_user_id.into(),
            title: title.into(),
            thumbnail_url: None,
            media_count: None,
            status: NotificationStatus::Requested,
            result_media_id: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status change, enforcing the monotonic ordering and the
    /// result/error field invariants.
    pub fn transition(&mut self, update: NotificationUpdate) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(update.status) {
            return Err(InvalidTransition {
                from: self.status,
                to: update.status,
            });
        }

        self.status = update.status;
        if update.thumbnail_url.is_some() {
            self.thumbnail_url = update.thumbnail_url;
        }
        if update.media_count.is_some() {
            self.media_count = update.media_count;
        }
        match self.status {
            NotificationStatus::Completed => {
                self.result_media_id = update.result_media_id;
                self.error_message = None;
            }
            NotificationStatus::Failed => {
                self.error_message = update.error_message;
                self.result_media_id = None;
            }
            _ => {}
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        let mut n = GenerationNotification::new("u1", "a cat");
        assert_eq!(n.status, NotificationStatus::Requested);

        n.transition(NotificationUpdate::processing()).unwrap();
        assert_eq!(n.status, NotificationStatus::Processing);

        n.transition(NotificationUpdate::completed(
            MediaId::from_string("m-1"),
            Some("https://cdn/t.jpg".into()),
        ))
        .unwrap();
        assert_eq!(n.status, NotificationStatus::Completed);
        assert_eq!(n.result_media_id, Some(MediaId::from_string("m-1")));
        assert!(n.error_message.is_none());
    }

    #[test]
    fn test_requested_can_fail_directly() {
        // Worker may dead-letter before ever reaching Processing.
        let mut n = GenerationNotification::new("u1", "a cat");
        n.transition(NotificationUpdate::failed("no capacity")).unwrap();
        assert_eq!(n.status, NotificationStatus::Failed);
        assert_eq!(n.error_message.as_deref(), Some("no capacity"));
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut n = GenerationNotification::new("u1", "a cat");
        n.transition(NotificationUpdate::processing()).unwrap();
        n.transition(NotificationUpdate::completed(MediaId::new(), None))
            .unwrap();

        let err = n.transition(NotificationUpdate::processing()).unwrap_err();
        assert_eq!(err.from, NotificationStatus::Completed);
        assert_eq!(err.to, NotificationStatus::Processing);
        // State untouched
        assert_eq!(n.status, NotificationStatus::Completed);
    }

    #[test]
    fn test_terminal_states_absorb() {
        let mut n = GenerationNotification::new("u1", "a cat");
        n.transition(NotificationUpdate::failed("boom")).unwrap();
        assert!(n
            .transition(NotificationUpdate::completed(MediaId::new(), None))
            .is_err());
    }

    #[test]
    fn test_result_iff_completed_error_iff_failed() {
        let mut n = GenerationNotification::new("u1", "a cat");
        n.transition(NotificationUpdate::processing()).unwrap();
        n.transition(NotificationUpdate::failed("policy rejection"))
            .unwrap();
        assert!(n.result_media_id.is_none());
        assert!(n.error_message.is_some());
    }

    #[test]
    fn test_status_serializes_screaming() {
        let json = serde_json::to_string(&NotificationStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }
}
