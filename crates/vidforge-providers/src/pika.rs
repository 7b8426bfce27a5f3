//! Pika image-to-video adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use vidforge_models::ProviderKind;

use crate::adapter::{build_http, check_inputs, post_json, ProviderConfig, VideoProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::{GenerationOutput, GenerationRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PikaRequest<'a> {
    prompt_text: &'a str,
    image: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PikaResponse {
    video_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Adapter for the Pika video API.
pub struct PikaProvider {
    http: Client,
    config: ProviderConfig,
}

impl PikaProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = build_http(&config)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env("PIKA", "https://api.pika.art"))
    }
}

#[async_trait]
impl VideoProvider for PikaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pika
    }

    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationOutput> {
        check_inputs(self.kind(), request)?;
        let image = request
            .source_media_url
            .as_deref()
            .ok_or(ProviderError::MissingInput("source_media_url"))?;

        let body = PikaRequest {
            prompt_text: &request.prompt,
            image,
            negative_prompt: request.options.negative_prompt.as_deref(),
            seed: request.options.seed,
            duration: request.options.duration_secs,
        };

        let response: PikaResponse =
            post_json(&self.http, &self.config, "/v1/videos", &body).await?;

        let video_url = response.video_url.filter(|u| !u.is_empty()).ok_or_else(|| {
            ProviderError::InvalidResponse("Pika response missing videoUrl".to_string())
        })?;

        Ok(GenerationOutput {
            video_url,
            thumbnail_url: response.thumbnail_url,
            duration_secs: response.duration,
            provider: self.kind(),
        })
    }
}
