//! Shared data models for the Vidforge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their queue states
//! - Provider identifiers and options
//! - User-facing generation notifications
//! - Stored media records
//! - WebSocket event schemas

pub mod id;
pub mod job;
pub mod media;
pub mod notification;
pub mod provider;
pub mod status;
pub mod ws;

// Re-export common types
pub use id::{JobId, MediaId, NotificationId};
pub use job::{GenerateVideoJob, JobState};
pub use media::StoredMedia;
pub use notification::{
    GenerationNotification, InvalidTransition, NotificationStatus, NotificationUpdate,
};
pub use provider::{ProviderKind, ProviderOptions};
pub use status::JobStatusRecord;
pub use ws::WsMessage;
