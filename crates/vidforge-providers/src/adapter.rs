//! The provider adapter trait and shared HTTP plumbing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use vidforge_models::ProviderKind;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{GenerationOutput, GenerationRequest};

/// Default provider call timeout: 10 minutes. Generation is slow but a
/// hung connection must not pin a worker slot forever.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Per-provider HTTP configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Build config from `{PREFIX}_API_URL` and `{PREFIX}_API_KEY`.
    ///
    /// The timeout comes from `PROVIDER_TIMEOUT_SECS`, shared across
    /// providers.
    pub fn from_env(prefix: &str, default_base_url: &str) -> Self {
        Self {
            base_url: std::env::var(format!("{}_API_URL", prefix))
                .unwrap_or_else(|_| default_base_url.to_string()),
            api_key: std::env::var(format!("{}_API_KEY", prefix)).unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

/// A video generation backend.
///
/// Implementations are stateless HTTP clients; one instance serves all
/// concurrent jobs.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Which provider this adapter speaks to.
    fn kind(&self) -> ProviderKind;

    /// Run one generation to completion and return the output URL.
    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationOutput>;
}

/// Validate the request against the provider's input requirements.
pub(crate) fn check_inputs(kind: ProviderKind, request: &GenerationRequest) -> ProviderResult<()> {
    if kind.requires_prompt() && request.prompt.trim().is_empty() {
        return Err(ProviderError::MissingInput("prompt"));
    }
    if kind.requires_source_media() && request.source_media_url.is_none() {
        return Err(ProviderError::MissingInput("source_media_url"));
    }
    Ok(())
}

/// Build the shared reqwest client for an adapter.
pub(crate) fn build_http(config: &ProviderConfig) -> ProviderResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(ProviderError::Network)
}

/// POST a JSON body with bearer auth and decode the JSON response.
///
/// Maps 4xx to [`ProviderError::Rejected`], 5xx to
/// [`ProviderError::Unavailable`], and a reqwest timeout to
/// [`ProviderError::Timeout`].
pub(crate) async fn post_json<B: Serialize, R: DeserializeOwned>(
    http: &Client,
    config: &ProviderConfig,
    path: &str,
    body: &B,
) -> ProviderResult<R> {
    let url = format!("{}{}", config.base_url, path);
    debug!("Sending generation request to {}", url);

    let response = http
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(config.timeout.as_secs())
            } else {
                ProviderError::Network(e)
            }
        })?;

    let status = response.status();
    if status.is_client_error() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Unavailable(format!(
            "{}: {}",
            status, message
        )));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        let config = ProviderConfig::from_env("NO_SUCH_PROVIDER", "https://api.example.com");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.api_key, "");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_check_inputs_missing_prompt() {
        let request = GenerationRequest::new("   ");
        let err = check_inputs(ProviderKind::Runway, &request).unwrap_err();
        assert!(matches!(err, ProviderError::MissingInput("prompt")));
    }

    #[test]
    fn test_check_inputs_missing_source_media() {
        let request = GenerationRequest::new("a cat");
        let err = check_inputs(ProviderKind::Kling, &request).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MissingInput("source_media_url")
        ));

        // Text-to-video providers do not need one.
        assert!(check_inputs(ProviderKind::Runway, &request).is_ok());
    }
}
