//! Crate-level error types
//!
//! Protocol failures (duplicate ids, malformed frames, ...) never surface here:
//! they are answered on the offending connection by the relay handler. This
//! error covers the process boundary: binding, serving, and encoding.

use thiserror::Error;

/// Result alias for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (bind, accept, signal setup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket transport error
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}
