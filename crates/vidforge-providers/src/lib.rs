//! HTTP adapters for external video generation providers.
//!
//! Each provider speaks its own wire dialect; the [`VideoProvider`] trait
//! normalizes them behind a single `generate` call so the worker never
//! branches on provider identity. [`ProviderRegistry`] owns the adapter
//! instances and dispatches by [`vidforge_models::ProviderKind`].

pub mod adapter;
pub mod error;
pub mod kling;
pub mod luma;
pub mod pika;
pub mod registry;
pub mod runway;
pub mod types;

pub use adapter::{ProviderConfig, VideoProvider};
pub use error::{ProviderError, ProviderResult};
pub use kling::KlingProvider;
pub use luma::LumaProvider;
pub use pika::PikaProvider;
pub use registry::ProviderRegistry;
pub use runway::RunwayProvider;
pub use types::{GenerationOutput, GenerationRequest};
