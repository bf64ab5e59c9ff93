//! Error types for the Aisha domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; callers wrap them in
//! their own (see `aisha_agent::ChatError`).

use thiserror::Error;

// --- Bounded context errors ---

/// Failures of the model invocation step.
///
/// None of these are retried; the chat handler reports them to the caller
/// as a generic server error.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Language classification failed. Always recovered by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("No text to classify")]
    EmptyInput,

    #[error("Language could not be determined for {chars} chars of input")]
    Undetermined { chars: usize },
}
