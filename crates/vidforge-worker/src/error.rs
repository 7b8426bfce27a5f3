//! Worker error types.

use thiserror::Error;

use vidforge_models::ProviderKind;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No adapter registered for provider: {0}")]
    NoAdapter(ProviderKind),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    Provider(#[from] vidforge_providers::ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] vidforge_storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] vidforge_notify::NotifyError),

    #[error("Queue error: {0}")]
    Queue(#[from] vidforge_queue::QueueError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether another attempt against the same job could succeed.
    ///
    /// Transient provider faults are retryable within the attempt
    /// budget. Persistence failures are terminal: the provider output
    /// already exists and a blind retry would regenerate it.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidforge_providers::ProviderError;
    use vidforge_storage::StorageError;

    #[test]
    fn test_transient_provider_error_is_retryable() {
        let err = WorkerError::from(ProviderError::Unavailable("503".to_string()));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_provider_rejection_is_permanent() {
        let err = WorkerError::from(ProviderError::Rejected {
            status: 400,
            message: "policy".to_string(),
        });
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_persistence_failure_is_permanent() {
        let err = WorkerError::from(StorageError::UploadFailed("broken pipe".to_string()));
        assert!(!err.is_retryable());
    }
}
