//! Connection handles

use pylon_transport::TransportSender;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Opaque, comparable identity of a live connection.
///
/// Monotonically assigned by the registry and never reused, so identity
/// comparison against the device slot stays valid for the whole process
/// lifetime regardless of how the transport recycles sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live client connection.
///
/// The transport owns the socket; the hub holds this non-owning handle
/// carrying routing metadata and the sender half.
pub struct Connection {
    /// Registry-assigned identity
    pub id: ConnectionId,
    /// Peer address
    pub addr: SocketAddr,
    /// Transport sender for this connection
    sender: Arc<dyn TransportSender>,
    /// Connection establishment time
    pub connected_at: Instant,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        addr: SocketAddr,
        sender: Arc<dyn TransportSender>,
    ) -> Self {
        Self {
            id,
            addr,
            sender,
            connected_at: Instant::now(),
        }
    }

    /// Send a text frame, fire-and-forget.
    ///
    /// A failed send means the peer closed concurrently; the frame is
    /// dropped, never retried.
    pub async fn send(&self, text: String) {
        if let Err(e) = self.sender.send(text).await {
            debug!("dropping frame for {}: {}", self.id, e);
        }
    }

    /// Whether the underlying transport is still open
    pub fn is_open(&self) -> bool {
        self.sender.is_connected()
    }

    /// Close the connection with a status code and reason
    pub async fn close(&self, code: u16, reason: &str) {
        let _ = self.sender.close(code, reason).await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("open", &self.is_open())
            .finish()
    }
}
