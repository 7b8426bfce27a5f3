//! Luma Dream Machine adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use vidforge_models::ProviderKind;

use crate::adapter::{build_http, check_inputs, post_json, ProviderConfig, VideoProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::{GenerationOutput, GenerationRequest};

#[derive(Debug, Serialize)]
struct LumaRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyframes: Option<LumaKeyframes<'a>>,
}

#[derive(Debug, Serialize)]
struct LumaKeyframes<'a> {
    frame0: LumaImageRef<'a>,
}

#[derive(Debug, Serialize)]
struct LumaImageRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct LumaResponse {
    assets: Option<LumaAssets>,
}

#[derive(Debug, Deserialize)]
struct LumaAssets {
    video: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

/// Adapter for the Luma Dream Machine API.
pub struct LumaProvider {
    http: Client,
    config: ProviderConfig,
}

impl LumaProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = build_http(&config)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env("LUMA", "https://api.lumalabs.ai"))
    }
}

#[async_trait]
impl VideoProvider for LumaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Luma
    }

    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationOutput> {
        check_inputs(self.kind(), request)?;

        let body = LumaRequest {
            prompt: &request.prompt,
            aspect_ratio: request.options.aspect_ratio.as_deref(),
            resolution: request.options.resolution.as_deref(),
            keyframes: request.source_media_url.as_deref().map(|url| LumaKeyframes {
                frame0: LumaImageRef { kind: "image", url },
            }),
        };

        let response: LumaResponse = post_json(
            &self.http,
            &self.config,
            "/dream-machine/v1/generations",
            &body,
        )
        .await?;

        let assets = response.assets.ok_or_else(|| {
            ProviderError::InvalidResponse("Luma response missing assets".to_string())
        })?;
        let video_url = assets.video.filter(|u| !u.is_empty()).ok_or_else(|| {
            ProviderError::InvalidResponse("Luma response missing video asset".to_string())
        })?;

        Ok(GenerationOutput {
            video_url,
            thumbnail_url: assets.image,
            duration_secs: request.options.duration_secs.map(f64::from),
            provider: self.kind(),
        })
    }
}
