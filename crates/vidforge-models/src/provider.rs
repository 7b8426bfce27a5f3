//! Generation provider identifiers and options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported third-party generation providers.
///
/// Adding a provider means adding a variant here and registering an
/// adapter for it; dispatch everywhere else is exhaustive over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Kling image-to-video
    Kling,
    /// Runway text/image-to-video
    Runway,
    /// Luma Dream Machine
    Luma,
    /// Pika image-to-video
    Pika,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Kling,
        ProviderKind::Runway,
        ProviderKind::Luma,
        ProviderKind::Pika,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Kling => "kling",
            ProviderKind::Runway => "runway",
            ProviderKind::Luma => "luma",
            ProviderKind::Pika => "pika",
        }
    }

    /// Whether this provider conditions generation on a source image/video.
    pub fn requires_source_media(&self) -> bool {
        matches!(self, ProviderKind::Kling | ProviderKind::Pika)
    }

    /// Whether this provider is driven by a text prompt.
    ///
    /// All current providers are; kept explicit so validation reads
    /// from the variant rather than assuming.
    pub fn requires_prompt(&self) -> bool {
        true
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kling" => Ok(ProviderKind::Kling),
            "runway" => Ok(ProviderKind::Runway),
            "luma" => Ok(ProviderKind::Luma),
            "pika" => Ok(ProviderKind::Pika),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Error for unrecognized provider names.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Provider-specific generation knobs.
///
/// Common fields are typed; anything else rides in `extra` and is passed
/// through to the provider untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderOptions {
    /// Output duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,

    /// Target aspect ratio, e.g. "16:9"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Output resolution, e.g. "1080p"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// Deterministic seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Negative prompt (providers that support it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Free-form provider-specific parameters
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProviderOptions {
    pub fn is_empty(&self) -> bool {
        self.duration_secs.is_none()
            && self.aspect_ratio.is_none()
            && self.resolution.is_none()
            && self.seed.is_none()
            && self.negative_prompt.is_none()
            && self.extra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trip() {
        for kind in ProviderKind::ALL {
            let parsed: ProviderKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_provider_kind_unknown() {
        assert!("sora".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_image_conditioned_providers() {
        assert!(ProviderKind::Kling.requires_source_media());
        assert!(ProviderKind::Pika.requires_source_media());
        assert!(!ProviderKind::Runway.requires_source_media());
        assert!(!ProviderKind::Luma.requires_source_media());
    }

    #[test]
    fn test_options_extra_flattened() {
        let json = r#"{"duration_secs":5,"camera_motion":"zoom_out"}"#;
        let opts: ProviderOptions = serde_json::from_str(json).unwrap();
        assert_eq!(opts.duration_secs, Some(5));
        assert_eq!(
            opts.extra.get("camera_motion").and_then(|v| v.as_str()),
            Some("zoom_out")
        );
    }
}
