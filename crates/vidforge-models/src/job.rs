//! Generation job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::{JobId, NotificationId};
use crate::provider::{ProviderKind, ProviderOptions};

/// Job state in the queue.
///
/// `Queued -> Active` on claim, `Active -> Completed | Failed` on
/// resolution, `Active -> Queued` on a retryable failure with attempt
/// budget remaining. Terminal states never transition out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for a worker
    #[default]
    Queued,
    /// Claimed by exactly one worker
    Active,
    /// Generation and persistence both succeeded
    Completed,
    /// Retries exhausted or non-retryable failure
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A queued request to generate a video via a specific provider.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateVideoJob {
    /// Unique job ID
    pub job_id: JobId,

    /// Which provider handles this job; immutable once enqueued
    pub provider: ProviderKind,

    /// Text prompt driving the generation
    pub prompt: String,

    /// Source image/video reference for conditioned providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_media_url: Option<String>,

    /// Owning user
    pub owner_user_id: String,

    /// Correlated notification record, if one was created at accept time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<NotificationId>,

    /// Provider-specific knobs
    #[serde(default)]
    pub options: ProviderOptions,

    /// Enqueue timestamp
    pub created_at: DateTime<Utc>,
}

impl GenerateVideoJob {
    pub fn new(
        provider: ProviderKind,
        prompt: impl Into<String>,
        owner_user_id: impl Into<String>,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            provider,
            prompt: prompt.into(),
            source_media_url: None,
            owner_user_id: owner_user_id.into(),
            notification_id: None,
            options: ProviderOptions::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_source_media(mut self, url: impl Into<String>) -> Self {
        self.source_media_url = Some(url.into());
        self
    }

    pub fn with_notification(mut self, id: NotificationId) -> Self {
        self.notification_id = Some(id);
        self
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    /// Key used to reject duplicate submissions of the same request.
    pub fn idempotency_key(&self) -> String {
        format!("{}:{}", self.owner_user_id, self.job_id)
    }

    /// Validate the fields the pipeline depends on.
    ///
    /// Returns the names of missing required parameters, which the
    /// producer surfaces verbatim in its 400 response.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let mut missing = Vec::new();

        if self.owner_user_id.trim().is_empty() {
            missing.push("ownerUserId");
        }
        if self.provider.requires_prompt() && self.prompt.trim().is_empty() {
            missing.push("prompt");
        }
        if self.provider.requires_source_media()
            && self
                .source_media_url
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            missing.push("sourceMediaUrl");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}
