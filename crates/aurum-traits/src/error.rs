//! Error types for upstream source operations.

use thiserror::Error;

/// Error raised by an upstream price source.
///
/// Sources must return `Ok` with an empty payload when the upstream answered
/// but had nothing; these variants are reserved for real failures.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection to the upstream failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Upstream did not answer in time
    #[error("timeout")]
    Timeout,

    /// Upstream refused the request because of rate limits
    #[error("rate limited")]
    RateLimited,

    /// Response could not be parsed
    #[error("parse error: {0}")]
    ParseError(String),

    /// Source is not configured or not reachable
    #[error("source not available: {0}")]
    SourceNotAvailable(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        SourceError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::ParseError(e.to_string())
    }
}
