//! Hub: accept loop and connection lifecycle

use parking_lot::RwLock;
use pylon_core::status;
use pylon_transport::{TransportEvent, TransportReceiver, TransportSender, TransportServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[cfg(feature = "websocket")]
use pylon_transport::WebSocketServer;

use crate::error::Result;
use crate::registry::Registry;
use crate::routing;

/// Close code for graceful shutdown (WebSocket "normal closure")
const CLOSE_NORMAL: u16 = 1000;

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Server name, used in logs
    pub name: String,
    /// Broadcast a "device offline" status to survivors when the device
    /// drops. The device slot is cleared either way.
    pub notify_device_offline: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: "Pylon Hub".to_string(),
            notify_device_offline: true,
        }
    }
}

/// The relay hub
pub struct Hub {
    config: HubConfig,
    registry: Arc<Registry>,
    /// Running flag
    running: Arc<RwLock<bool>>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Registry::new()),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Serve using any [`TransportServer`] implementation.
    pub async fn serve_on<S>(&self, mut server: S) -> Result<()>
    where
        S: TransportServer + 'static,
        S::Sender: 'static,
        S::Receiver: 'static,
    {
        info!("{} accepting connections", self.config.name);
        *self.running.write() = true;

        while *self.running.read() {
            match server.accept().await {
                Ok((sender, receiver, addr)) => {
                    self.handle_connection(Arc::new(sender), receiver, addr);
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Start the hub on WebSocket (default transport).
    #[cfg(feature = "websocket")]
    pub async fn serve_websocket(&self, addr: &str) -> Result<()> {
        let server = WebSocketServer::bind(addr).await?;
        self.serve_on(server).await
    }

    /// Drive one accepted connection: register it, route its frames,
    /// unregister on close and notify survivors if the device went away.
    fn handle_connection(
        &self,
        sender: Arc<dyn TransportSender>,
        mut receiver: impl TransportReceiver + 'static,
        addr: SocketAddr,
    ) {
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let conn = registry.register(addr, sender);
            info!("client {} connected from {}", conn.id, addr);

            while *running.read() {
                match receiver.recv().await {
                    Some(TransportEvent::Text(text)) => {
                        routing::route(&registry, &conn, &text).await;
                    }
                    Some(TransportEvent::Disconnected { reason }) => {
                        info!("client {} disconnected: {:?}", conn.id, reason);
                        break;
                    }
                    Some(TransportEvent::Error(e)) => {
                        error!("client {} transport error: {}", conn.id, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            // Slot clearing is unconditional; the survivor notification is
            // a policy hook
            let device_lost = registry.unregister(conn.id);
            if device_lost {
                info!("device {} went offline", conn.id);
                if config.notify_device_offline {
                    routing::broadcast_all(&registry, status(routing::STATUS_DEVICE_OFFLINE))
                        .await;
                }
            }
        });
    }

    /// Stop accepting new connections
    pub fn stop(&self) {
        *self.running.write() = false;
    }

    /// Close every open connection gracefully, then stop.
    pub async fn shutdown(&self) {
        self.stop();
        for conn in self.registry.snapshot() {
            conn.close(CLOSE_NORMAL, "server shutting down").await;
            self.registry.unregister(conn.id);
        }
    }

    /// Number of open connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// The underlying registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
