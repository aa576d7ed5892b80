//! Error types for the sync connector
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sync connector
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or expired credentials. Fatal: the run aborts and no
    /// output is written.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The upstream API signalled throttling. Retried with backoff.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Retriable connectivity failure (timeout, connection reset,
    /// upstream 5xx). Retried with backoff.
    #[error("Transient network error: {0}")]
    Transient(String),

    /// Non-retriable API failure (unexpected status or response shape)
    #[error("API error: {0}")]
    Api(String),

    /// Prior output table is structurally incompatible with the
    /// current schema
    #[error("Schema mismatch in prior table: {0}")]
    SchemaMismatch(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table store errors
    #[error("Table store error: {0}")]
    Store(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization/deserialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a transient network error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a table store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether a retry with backoff may succeed.
    ///
    /// Only rate limiting and transient connectivity failures are
    /// retriable; authentication and schema problems need operator
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Transient(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::rate_limited("429").is_retryable());
        assert!(Error::transient("connection reset").is_retryable());
        assert!(!Error::auth("bad token").is_retryable());
        assert!(!Error::schema_mismatch("id column").is_retryable());
        assert!(!Error::api("unexpected body").is_retryable());
    }
}
