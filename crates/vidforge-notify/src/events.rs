//! Live generation events via Redis Pub/Sub.
//!
//! Events fan out on per-user channels so one WebSocket subscription
//! covers every job the user has in flight. Delivery is fire-and-forget;
//! the durable truth lives in the notification store.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vidforge_models::{JobId, MediaId, ProviderKind, WsMessage};

use crate::error::NotifyResult;

/// Event published to a user's channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEvent {
    /// Recipient user
    pub user_id: String,
    /// WebSocket message
    pub message: WsMessage,
}

/// Channel for publishing/subscribing to per-user generation events.
pub struct EventChannel {
    client: redis::Client,
}

impl EventChannel {
    /// Create a new event channel.
    pub fn new(redis_url: &str) -> NotifyResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create a channel from the `REDIS_URL` environment variable.
    pub fn from_env() -> NotifyResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    /// Get the channel name for a user.
    pub fn channel_name(user_id: &str) -> String {
        format!("events:user:{}", user_id)
    }

    /// Publish an event.
    pub async fn publish(&self, event: &UserEvent) -> NotifyResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.user_id);
        let payload = serde_json::to_string(event)?;

        debug!("Publishing generation event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish a generation-started event.
    pub async fn started(
        &self,
        user_id: &str,
        job_id: &JobId,
        provider: ProviderKind,
    ) -> NotifyResult<()> {
        self.publish(&UserEvent {
            user_id: user_id.to_string(),
            message: WsMessage::started(job_id.clone(), provider),
        })
        .await
    }

    /// Publish a progress update.
    pub async fn progress(&self, user_id: &str, job_id: &JobId, value: u8) -> NotifyResult<()> {
        self.publish(&UserEvent {
            user_id: user_id.to_string(),
            message: WsMessage::progress(job_id.clone(), value),
        })
        .await
    }

    /// Publish a generation-completed event.
    pub async fn completed(
        &self,
        user_id: &str,
        job_id: &JobId,
        media_id: &MediaId,
        media_url: &str,
        provider: ProviderKind,
    ) -> NotifyResult<()> {
        self.publish(&UserEvent {
            user_id: user_id.to_string(),
            message: WsMessage::completed(job_id.clone(), media_id.clone(), media_url, provider),
        })
        .await
    }

    /// Publish a generation-failed event.
    pub async fn failed(
        &self,
        user_id: &str,
        job_id: &JobId,
        message: impl Into<String>,
        provider: ProviderKind,
    ) -> NotifyResult<()> {
        self.publish(&UserEvent {
            user_id: user_id.to_string(),
            message: WsMessage::failed(job_id.clone(), message, provider),
        })
        .await
    }

    /// Subscribe to a user's events.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(
        &self,
        user_id: &str,
    ) -> NotifyResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = UserEvent> + Send>>> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        let channel = Self::channel_name(user_id);

        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}
