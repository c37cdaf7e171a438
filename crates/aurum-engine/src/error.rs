//! Engine error types.

use thiserror::Error;

/// Failure of a single fetch operation.
///
/// Callers switch on these variants to pick a response status. Upstream
/// error details are logged, never carried here beyond a readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Every attempted upstream source failed or returned nothing
    #[error("no data available: {0}")]
    UpstreamUnavailable(String),

    /// Caller input rejected before any upstream call
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A well-formed date lookup yielded no record
    #[error("not found: {0}")]
    NotFound(String),
}

/// Engine lifecycle error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Background tasks already running
    #[error("engine is already running")]
    AlreadyRunning,
}
