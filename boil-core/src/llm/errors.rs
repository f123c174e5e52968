//! Error types for text-generation calls
//!
//! Every provider maps its transport and HTTP failures onto [`LLMError`] so
//! that stages see one taxonomy regardless of the backing service.

use std::time::Duration;
use thiserror::Error;

/// Main error type for text-generation operations
#[derive(Debug, Error)]
pub enum LLMError {
    /// API key is missing, invalid or revoked
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit has been exceeded or the service is overloaded
    #[error("Rate limited by {provider}. Retry after {retry_after:?}")]
    RateLimited { provider: String, retry_after: Option<Duration> },

    /// The upstream service failed on its side
    #[error("{provider} server error (status {status})")]
    ServerError { provider: String, status: u16 },

    /// The service answered but produced no usable text
    #[error("Empty reply: {context}")]
    EmptyReply { context: String },

    /// A structured reply could not be parsed
    #[error("Unparseable {expected} reply: {message}")]
    UnparseableReply { expected: String, message: String },

    /// Network error occurred
    #[error("Network error: {message}")]
    Network { message: String },

    /// API returned an error we do not classify further
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Client could not be configured
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl LLMError {
    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    /// Create a rate limit error
    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited { provider: provider.into(), retry_after }
    }

    /// Create an upstream server error
    pub fn server(provider: impl Into<String>, status: u16) -> Self {
        Self::ServerError { provider: provider.into(), status }
    }

    /// Create an empty reply error
    pub fn empty_reply(context: impl Into<String>) -> Self {
        Self::EmptyReply { context: context.into() }
    }

    /// Create a parse error for a structured reply
    pub fn unparseable(expected: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnparseableReply { expected: expected.into(), message: message.into() }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api { status, message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Map a non-success HTTP status onto the taxonomy
    pub fn from_status(
        provider: &str,
        status: u16,
        body: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        match status {
            401 | 403 => Self::unauthorized(format!("invalid {} API key", provider)),
            429 => Self::rate_limited(provider, retry_after),
            500..=599 => Self::server(provider, status),
            _ => Self::api(status, body),
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ServerError { .. } | Self::Network { .. })
    }
}

/// Result type for text-generation operations
pub type LLMResult<T> = Result<T, LLMError>;

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::api(status.as_u16(), err.to_string()),
            None => Self::Network { message: err.to_string() },
        }
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        Self::UnparseableReply { expected: "JSON".to_string(), message: err.to_string() }
    }
}
