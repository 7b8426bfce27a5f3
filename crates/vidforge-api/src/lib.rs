//! Axum HTTP API server.
//!
//! This crate provides:
//! - The generation producer endpoint (`POST /api/generate`)
//! - Job status polling and notification lookup
//! - Per-user WebSocket push of generation events
//! - Prometheus metrics and security headers

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
