//! Persisted generation results.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::MediaId;
use crate::provider::ProviderKind;

/// A durably persisted generation output.
///
/// Created exactly once per successfully completed job; immutable after.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoredMedia {
    /// Stable identifier
    pub id: MediaId,
    /// Display name
    pub name: String,
    /// Owning user
    pub owner_user_id: String,
    /// Re-hosted media URL
    pub url: String,
    /// Thumbnail URL, if one was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Prompt the media was generated from
    pub source_prompt: String,
    /// Provider that produced it
    pub source_provider: ProviderKind,
    /// Size of the re-hosted object in bytes
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl StoredMedia {
    /// Derive a display name from the prompt, truncated for UI listings.
    pub fn name_from_prompt(prompt: &str) -> String {
        const MAX: usize = 60;
        let trimmed = prompt.trim();
        if trimmed.chars().count() <= MAX {
            trimmed.to_string()
        } else {
            let cut: String = trimmed.chars().take(MAX).collect();
            format!("{}…", cut.trim_end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_short_prompt() {
        assert_eq!(StoredMedia::name_from_prompt("a cat"), "a cat");
    }

    #[test]
    fn test_name_from_long_prompt_truncates() {
        let prompt = "x".repeat(200);
        let name = StoredMedia::name_from_prompt(&prompt);
        assert!(name.chars().count() <= 61);
        assert!(name.ends_with('…'));
    }
}
