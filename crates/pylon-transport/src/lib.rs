//! Pylon Transport Layer
//!
//! Connection primitives for the relay hub. The hub itself is
//! transport-agnostic and only talks to the traits in [`traits`];
//! WebSocket (text frames over tokio-tungstenite) is the shipped
//! implementation.

pub mod error;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use error::{Result, TransportError};
pub use traits::{Transport, TransportEvent, TransportReceiver, TransportSender, TransportServer};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketServer, WebSocketTransport};
