//! Notification records and real-time event delivery.
//!
//! Two concerns live here:
//! - [`NotificationStore`]: durable, monotonic status records a client
//!   can poll after reconnecting.
//! - [`EventChannel`]: per-user Redis Pub/Sub fan-out for live updates.

pub mod error;
pub mod events;
pub mod store;

pub use error::{NotifyError, NotifyResult};
pub use events::{EventChannel, UserEvent};
pub use store::NotificationStore;
