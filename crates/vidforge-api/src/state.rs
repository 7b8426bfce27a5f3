//! Application state.

use std::sync::Arc;

use vidforge_notify::{EventChannel, NotificationStore};
use vidforge_queue::JobQueue;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<JobQueue>,
    pub notifications: Arc<NotificationStore>,
    pub events: Arc<EventChannel>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let queue = JobQueue::from_env()?;
        queue.init().await?;

        let notifications = NotificationStore::from_env()?;
        let events = EventChannel::from_env()?;

        Ok(Self {
            config,
            queue: Arc::new(queue),
            notifications: Arc::new(notifications),
            events: Arc::new(events),
        })
    }
}
