//! HTTP handlers.

pub mod generate;
pub mod health;
pub mod jobs;
pub mod notifications;

pub use generate::generate_video;
pub use health::{health, ready};
pub use jobs::get_job_status;
pub use notifications::get_notification;
