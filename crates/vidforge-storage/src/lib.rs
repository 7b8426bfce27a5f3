//! Object storage for generated media.
//!
//! Provider output URLs are ephemeral, so every completed generation is
//! re-hosted into an S3-compatible bucket before the job is acked. The
//! [`MediaStore`] owns that copy step and writes a [`StoredMedia`] record
//! beside each object.
//!
//! [`StoredMedia`]: vidforge_models::StoredMedia

pub mod client;
pub mod error;
pub mod media;

pub use client::{ObjectStoreClient, StoreConfig};
pub use error::{StorageError, StorageResult};
pub use media::MediaStore;
