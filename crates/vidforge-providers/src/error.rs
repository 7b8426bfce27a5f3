//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the request (4xx). Retrying will not help.
    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider is down or overloaded (5xx).
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The job is missing an input this provider requires.
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether a fresh attempt against the same provider could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Unavailable(_) | ProviderError::Timeout(_) => true,
            ProviderError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
