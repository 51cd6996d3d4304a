use thiserror::Error;

/// Application-wide error types for jobtailor.
#[derive(Error, Debug)]
pub enum AppError {
    /// Payload could not be serialized. A data-shape bug, never retried.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The service rejected the API key. User must fix configuration.
    #[error("authentication rejected (HTTP {0}): check your API key")]
    Auth(u16),

    /// Throttled repeatedly until the retry budget ran out.
    #[error("rate limited: max retries exceeded")]
    RateLimited,

    /// Any other non-success status or network failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The caller's cancellation fired mid-request or mid-backoff.
    #[error("operation cancelled")]
    Cancelled,

    /// Reply unusable: unparseable, or one or more mandatory fields empty.
    /// Field lengths are carried so the missing one is diagnosable.
    #[error(
        "model reply missing required fields (company={company_len} role={role_len} resume={resume_len} chars)"
    )]
    MalformedReply {
        company_len: usize,
        role_len: usize,
        resume_len: usize,
    },
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::Timeout(_) | AppError::RateLimited
        )
    }
}
