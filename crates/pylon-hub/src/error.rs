//! Hub error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] pylon_transport::TransportError),

    #[error("protocol error: {0}")]
    Core(#[from] pylon_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
