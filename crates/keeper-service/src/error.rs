//! Service-layer error types.
//!
//! `ServiceError` is transport-agnostic. The HTTP crate maps it to status
//! codes and JSON error bodies.

/// Service error shared across transports.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Session is absent or already expired.
    #[error("session not found or expired")]
    NotFound,

    /// Malformed TTL text (see `ttl::parse_secs`).
    #[error("{0}")]
    InvalidInput(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}
