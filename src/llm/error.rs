//! Typed errors for completion calls
//!
//! Lets the stages tell transport problems (network, auth, rate limits,
//! provider outages) apart from malformed responses without string matching.

use thiserror::Error;

/// Completion provider errors with typed variants
///
/// - `MissingCredential` - the provider needs an API key and none is configured
/// - `Unauthorized` (401) - key rejected by the provider
/// - `RateLimited` (429) - quota exceeded
/// - `BadRequest` (400) - the provider refused the request (bad model name, too many tokens)
/// - `ServiceError` (5xx) - provider outage
/// - `Network` - connection refused, DNS, timeout
/// - `InvalidResponse` - the body could not be decoded or held no choices
/// - `Other` - anything else
#[derive(Debug, Error)]
pub enum LlmError {
    /// No credential found in the environment variable the provider reads
    #[error("Missing credential: set {0}")]
    MissingCredential(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Body was not the chat-completions shape we expect
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl LlmError {
    /// True for failures talking to the provider (as opposed to the provider
    /// answering with something we cannot use)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::MissingCredential(_)
                | LlmError::Unauthorized(_)
                | LlmError::RateLimited(_)
                | LlmError::ServiceError(_)
                | LlmError::Network(_)
        )
    }

    /// Convert HTTP status code and error text into typed LlmError
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::Unauthorized(error_text),
            429 => LlmError::RateLimited(error_text),
            400 | 404 | 413 | 422 => LlmError::BadRequest(error_text),
            500..=599 => LlmError::ServiceError(error_text),
            _ => LlmError::Other(anyhow::anyhow!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert reqwest send/decode errors into typed LlmError
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            LlmError::Network(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string())
        } else {
            LlmError::Other(e.into())
        }
    }
}
