//! Provider-neutral request/response types.

use serde::{Deserialize, Serialize};

use vidforge_models::{ProviderKind, ProviderOptions};

/// Normalized generation request handed to any adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text prompt
    pub prompt: String,
    /// Source image/video URL for image-to-video providers
    pub source_media_url: Option<String>,
    /// Tuning options, interpreted per provider
    pub options: ProviderOptions,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_media_url: None,
            options: ProviderOptions::default(),
        }
    }

    pub fn with_source_media(mut self, url: impl Into<String>) -> Self {
        self.source_media_url = Some(url.into());
        self
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }
}

/// Normalized result of a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Provider-hosted URL of the generated video. Ephemeral; must be
    /// persisted to owned storage before the job completes.
    pub video_url: String,
    /// Optional provider-hosted thumbnail
    pub thumbnail_url: Option<String>,
    /// Reported clip duration, if the provider returns one
    pub duration_secs: Option<f64>,
    /// Which provider produced this output
    pub provider: ProviderKind,
}
