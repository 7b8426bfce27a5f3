//! Durable notification records in Redis.
//!
//! Records are JSON values under `vidforge:notify:{id}`, with a per-user
//! index set under `vidforge:notify:user:{user_id}` so recent notifications
//! can be listed. Transitions are read-modify-write; the monotonic ordering
//! is enforced by [`GenerationNotification::transition`] so a late Processing
//! update can never clobber a terminal state.

use redis::AsyncCommands;
use tracing::debug;

use vidforge_models::{GenerationNotification, NotificationId, NotificationUpdate};

use crate::error::{NotifyError, NotifyResult};

/// Default record TTL: 30 days.
const NOTIFICATION_TTL_SECS: u64 = 30 * 24 * 3600;

/// Redis-backed notification store.
pub struct NotificationStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl NotificationStore {
    /// Create a new store.
    pub fn new(redis_url: &str) -> NotifyResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            ttl_secs: NOTIFICATION_TTL_SECS,
        })
    }

    /// Create a store from the `REDIS_URL` environment variable.
    pub fn from_env() -> NotifyResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    fn record_key(id: &NotificationId) -> String {
        format!("vidforge:notify:{}", id)
    }

    fn user_index_key(user_id: &str) -> String {
        format!("vidforge:notify:user:{}", user_id)
    }

    /// Persist a freshly created notification.
    pub async fn create(&self, notification: &GenerationNotification) -> NotifyResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(notification)?;

        conn.set_ex::<_, _, ()>(Self::record_key(&notification.id), payload, self.ttl_secs)
            .await?;
        conn.lpush::<_, _, ()>(
            Self::user_index_key(&notification.owner_user_id),
            notification.id.to_string(),
        )
        .await?;
        conn.expire::<_, ()>(
            Self::user_index_key(&notification.owner_user_id),
            self.ttl_secs as i64,
        )
        .await?;

        debug!(notification_id = %notification.id, "Created notification record");
        Ok(())
    }

    /// Fetch a notification by id.
    pub async fn get(&self, id: &NotificationId) -> NotifyResult<Option<GenerationNotification>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::record_key(id)).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// List a user's most recent notifications, newest first.
    ///
    /// A limit of zero returns nothing; LRANGE would read `0..-1` as
    /// the whole index otherwise.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> NotifyResult<Vec<GenerationNotification>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = conn
            .lrange(Self::user_index_key(user_id), 0, limit as isize - 1)
            .await?;

        let mut notifications = Vec::with_capacity(ids.len());
        for id in ids {
            let payload: Option<String> = conn
                .get(Self::record_key(&NotificationId::from_string(id)))
                .await?;
            // Expired records disappear from the index lazily.
            if let Some(json) = payload {
                notifications.push(serde_json::from_str(&json)?);
            }
        }
        Ok(notifications)
    }

    /// Apply a status transition to a stored notification.
    ///
    /// Returns the updated record. Backward transitions are rejected with
    /// [`NotifyError::InvalidTransition`] and leave the record untouched.
    pub async fn transition(
        &self,
        id: &NotificationId,
        update: NotificationUpdate,
    ) -> NotifyResult<GenerationNotification> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload: Option<String> = conn.get(Self::record_key(id)).await?;
        let mut notification: GenerationNotification = match payload {
            Some(json) => serde_json::from_str(&json)?,
            None => return Err(NotifyError::NotFound(id.clone())),
        };

        let target = update.status;
        notification.transition(update)?;

        let payload = serde_json::to_string(&notification)?;
        conn.set_ex::<_, _, ()>(Self::record_key(id), payload, self.ttl_secs)
            .await?;

        debug!(notification_id = %id, status = %target, "Notification transitioned");
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_limit_lists_nothing() {
        // Returns before any connection is attempted.
        let store = NotificationStore::new("redis://127.0.0.1:1").unwrap();
        let listed = store.list_for_user("user-1", 0).await.unwrap();
        assert!(listed.is_empty());
    }
}
