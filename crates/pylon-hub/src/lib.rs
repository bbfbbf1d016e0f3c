//! Pylon Hub
//!
//! The relay core:
//! - Tracks open connections and the single privileged device slot
//! - Classifies inbound frames and routes them per message type
//! - Handles connection lifecycle, device-offline notification and
//!   graceful shutdown
//!
//! The hub is transport-agnostic: it serves over anything implementing
//! [`pylon_transport::TransportServer`]. WebSocket ships by default.
//!
//! # Example
//!
//! ```no_run
//! use pylon_hub::{Hub, HubConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Hub::new(HubConfig::default());
//!     hub.serve_websocket("0.0.0.0:8000").await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod hub;
pub mod registry;
pub mod routing;

#[cfg(test)]
mod testing;

pub use connection::{Connection, ConnectionId};
pub use error::{HubError, Result};
pub use hub::{Hub, HubConfig};
pub use registry::Registry;
