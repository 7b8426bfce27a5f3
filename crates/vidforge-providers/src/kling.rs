//! Kling image-to-video adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use vidforge_models::ProviderKind;

use crate::adapter::{build_http, check_inputs, post_json, ProviderConfig, VideoProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::{GenerationOutput, GenerationRequest};

#[derive(Debug, Serialize)]
struct KlingRequest<'a> {
    model: &'static str,
    prompt: &'a str,
    image_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct KlingResponse {
    data: KlingData,
}

#[derive(Debug, Deserialize)]
struct KlingData {
    video_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Adapter for the Kling video API.
pub struct KlingProvider {
    http: Client,
    config: ProviderConfig,
}

impl KlingProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = build_http(&config)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env("KLING", "https://api.klingai.com"))
    }
}

#[async_trait]
impl VideoProvider for KlingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Kling
    }

    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationOutput> {
        check_inputs(self.kind(), request)?;
        let image_url = request
            .source_media_url
            .as_deref()
            .ok_or(ProviderError::MissingInput("source_media_url"))?;

        let body = KlingRequest {
            model: "kling-v1-6",
            prompt: &request.prompt,
            image_url,
            duration: request.options.duration_secs,
            aspect_ratio: request.options.aspect_ratio.as_deref(),
            negative_prompt: request.options.negative_prompt.as_deref(),
        };

        let response: KlingResponse =
            post_json(&self.http, &self.config, "/v1/videos/image2video", &body).await?;

        let video_url = response
            .data
            .video_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Kling response missing video_url".to_string())
            })?;

        Ok(GenerationOutput {
            video_url,
            thumbnail_url: response.data.thumbnail_url,
            duration_secs: response.data.duration,
            provider: self.kind(),
        })
    }
}
