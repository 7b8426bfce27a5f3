//! WebSocket event types pushed to user sessions.
//!
//! Event names are part of the client contract and must not change.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::{JobId, MediaId};
use crate::provider::ProviderKind;

/// Real-time event envelope, tagged with the client-facing event name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum WsMessage {
    /// A worker started generating
    #[serde(rename = "video-generation-started")]
    GenerationStarted {
        #[serde(rename = "jobId")]
        job_id: JobId,
        provider: ProviderKind,
    },

    /// Coarse progress update (0-100)
    #[serde(rename = "video-generation-progress")]
    GenerationProgress {
        #[serde(rename = "jobId")]
        job_id: JobId,
        value: u8,
    },

    /// Generation and persistence succeeded
    #[serde(rename = "video-generation-completed")]
    GenerationCompleted {
        #[serde(rename = "jobId")]
        job_id: JobId,
        #[serde(rename = "mediaId")]
        media_id: MediaId,
        #[serde(rename = "mediaUrl")]
        media_url: String,
        provider: ProviderKind,
    },

    /// Generation failed terminally
    #[serde(rename = "video-generation-failed")]
    GenerationFailed {
        #[serde(rename = "jobId")]
        job_id: JobId,
        message: String,
        provider: ProviderKind,
    },
}

impl WsMessage {
    pub fn started(job_id: JobId, provider: ProviderKind) -> Self {
        WsMessage::GenerationStarted { job_id, provider }
    }

    pub fn progress(job_id: JobId, value: u8) -> Self {
        WsMessage::GenerationProgress {
            job_id,
            value: value.min(100),
        }
    }

    pub fn completed(
        job_id: JobId,
        media_id: MediaId,
        media_url: impl Into<String>,
        provider: ProviderKind,
    ) -> Self {
        WsMessage::GenerationCompleted {
            job_id,
            media_id,
            media_url: media_url.into(),
            provider,
        }
    }

    pub fn failed(job_id: JobId, message: impl Into<String>, provider: ProviderKind) -> Self {
        WsMessage::GenerationFailed {
            job_id,
            message: message.into(),
            provider,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WsMessage::GenerationCompleted { .. } | WsMessage::GenerationFailed { .. }
        )
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            WsMessage::GenerationStarted { job_id, .. }
            | WsMessage::GenerationProgress { job_id, .. }
            | WsMessage::GenerationCompleted { job_id, .. }
            | WsMessage::GenerationFailed { job_id, .. } => job_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let msg = WsMessage::started(JobId::from_string("job-12345678"), ProviderKind::Kling);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"video-generation-started\""));
        assert!(json.contains("\"provider\":\"kling\""));
    }

    #[test]
    fn test_completed_carries_media_fields() {
        let msg = WsMessage::completed(
            JobId::from_string("job-12345678"),
            MediaId::from_string("m-1"),
            "https://cdn/m-1.mp4",
            ProviderKind::Runway,
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"video-generation-completed\""));
        assert!(json.contains("\"mediaId\":\"m-1\""));
        assert!(json.contains("\"mediaUrl\":\"https://cdn/m-1.mp4\""));
    }

    #[test]
    fn test_progress_clamps() {
        let msg = WsMessage::progress(JobId::new(), 150);
        if let WsMessage::GenerationProgress { value, .. } = msg {
            assert_eq!(value, 100);
        } else {
            panic!("Expected progress message");
        }
    }

    #[test]
    fn test_terminal_detection() {
        let id = JobId::new();
        assert!(!WsMessage::started(id.clone(), ProviderKind::Luma).is_terminal());
        assert!(WsMessage::failed(id, "boom", ProviderKind::Luma).is_terminal());
    }
}
