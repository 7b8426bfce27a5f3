//! Runway text-to-video adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use vidforge_models::ProviderKind;

use crate::adapter::{build_http, check_inputs, post_json, ProviderConfig, VideoProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::{GenerationOutput, GenerationRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunwayRequest<'a> {
    model: &'static str,
    prompt_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RunwayResponse {
    /// Output asset URLs; first entry is the video
    #[serde(default)]
    output: Vec<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Adapter for the Runway generation API.
pub struct RunwayProvider {
    http: Client,
    config: ProviderConfig,
}

impl RunwayProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = build_http(&config)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env(
            "RUNWAY",
            "https://api.dev.runwayml.com",
        ))
    }
}

#[async_trait]
impl VideoProvider for RunwayProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Runway
    }

    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationOutput> {
        check_inputs(self.kind(), request)?;

        let body = RunwayRequest {
            model: "gen3a_turbo",
            prompt_text: &request.prompt,
            prompt_image: request.source_media_url.as_deref(),
            duration: request.options.duration_secs,
            ratio: request.options.aspect_ratio.as_deref(),
            seed: request.options.seed,
        };

        let response: RunwayResponse =
            post_json(&self.http, &self.config, "/v1/image_to_video", &body).await?;

        let video_url = response
            .output
            .into_iter()
            .find(|u| !u.is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Runway response has no output assets".to_string())
            })?;

        Ok(GenerationOutput {
            video_url,
            thumbnail_url: response.thumbnail,
            duration_secs: request.options.duration_secs.map(f64::from),
            provider: self.kind(),
        })
    }
}
