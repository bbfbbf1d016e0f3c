//! Pylon Core
//!
//! Wire-level types for the Pylon relay hub:
//! - Frame classification ([`classify`], [`Message`], [`MessageKind`])
//! - Server-originated status frames ([`status`])
//! - Protocol error types ([`Error`])
//!
//! Frames are JSON text. A case-sensitive `type` key selects the message
//! kind; `content` carries the human-readable payload for command, chat
//! and status frames. Sensor frames carry application-defined fields that
//! the hub forwards verbatim without inspecting.

pub mod error;
pub mod message;

pub use error::{Error, Result};
pub use message::{classify, status, Message, MessageKind};

/// Default WebSocket port
pub const DEFAULT_WS_PORT: u16 = 8000;
