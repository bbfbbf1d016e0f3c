//! Error types for Pylon

use thiserror::Error;

/// Result type alias for Pylon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pylon protocol error types
#[derive(Error, Debug)]
pub enum Error {
    /// Payload was not well-formed JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// Outbound frame could not be encoded
    #[error("encode error: {0}")]
    Encode(String),

    /// Connection-level failure surfaced by a transport
    #[error("connection error: {0}")]
    Connection(String),
}
