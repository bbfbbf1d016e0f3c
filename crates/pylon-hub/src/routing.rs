//! Routing engine
//!
//! One routing decision per inbound frame, no other side effects:
//!
//! | kind          | recipients                                           |
//! |---------------|------------------------------------------------------|
//! | sensor_data   | everyone but the sender; first sender gets promoted  |
//! | command       | the device only, status ack back to the sender       |
//! | chat_message  | everyone but the sender (device included)            |
//! | anything else | status reply to the sender only                      |
//!
//! Sends are fire-and-forget: a recipient that closed concurrently is
//! skipped, never retried.

use pylon_core::{classify, status, MessageKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionId};
use crate::registry::Registry;

pub const STATUS_DEVICE_ONLINE: &str = "device online";
pub const STATUS_DEVICE_OFFLINE: &str = "device offline";
pub const STATUS_COMMAND_SENT: &str = "command sent";
pub const STATUS_DEVICE_NOT_CONNECTED: &str = "device not connected";
pub const STATUS_NON_JSON: &str = "non-JSON message received";

/// Route one raw inbound frame from `sender`.
pub async fn route(registry: &Registry, sender: &Arc<Connection>, raw: &str) {
    let msg = match classify(raw) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("{}: unparseable frame: {}", sender.id, e);
            sender.send(status(STATUS_NON_JSON)).await;
            return;
        }
    };

    match msg.kind {
        MessageKind::SensorData => {
            // First sensor sender becomes the device; the broadcast goes
            // to everyone, the promoted sender included
            if registry.promote_to_device(sender.id) {
                info!("{} promoted to device", sender.id);
                broadcast_all(registry, status(STATUS_DEVICE_ONLINE)).await;
            }
            broadcast_except(registry, sender.id, raw).await;
        }

        MessageKind::Command => match registry.device() {
            Some(device) if device.is_open() => {
                debug!(
                    "{}: forwarding command {:?} to device {}",
                    sender.id, msg.content, device.id
                );
                device.send(raw.to_string()).await;
                sender.send(status(STATUS_COMMAND_SENT)).await;
            }
            _ => {
                debug!("{}: command but no device attached", sender.id);
                sender.send(status(STATUS_DEVICE_NOT_CONNECTED)).await;
            }
        },

        MessageKind::ChatMessage => {
            // Deliberately not filtered away from the device; it is free
            // to ignore chat frames
            broadcast_except(registry, sender.id, raw).await;
        }

        // status_update is server-originated; a client sending one gets
        // the same reply as any unrecognized tag
        MessageKind::StatusUpdate | MessageKind::Unknown(_) => {
            let tag = msg.kind.tag();
            debug!("{}: unrecognized frame type {:?}", sender.id, tag);
            sender
                .send(status(&format!("unknown type: {}", tag)))
                .await;
        }
    }
}

/// Fan one frame out to every open connection.
pub async fn broadcast_all(registry: &Registry, frame: String) {
    for conn in registry.snapshot() {
        conn.send(frame.clone()).await;
    }
}

/// Fan one frame out to every open connection except `exclude`.
pub async fn broadcast_except(registry: &Registry, exclude: ConnectionId, frame: &str) {
    for conn in registry.snapshot() {
        if conn.id != exclude {
            conn.send(frame.to_string()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSender;
    use serde_json::Value;

    fn join(registry: &Registry) -> (Arc<Connection>, Arc<RecordingSender>) {
        let sender = RecordingSender::new();
        let conn = registry.register("127.0.0.1:4000".parse().unwrap(), sender.clone());
        (conn, sender)
    }

    fn statuses(frames: &[String]) -> Vec<String> {
        frames
            .iter()
            .filter_map(|f| {
                let v: Value = serde_json::from_str(f).ok()?;
                if v["type"] == "status_update" {
                    Some(v["content"].as_str()?.to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn first_sensor_sender_becomes_device() {
        let registry = Registry::new();
        let (dev, dev_tx) = join(&registry);
        let (viewer, viewer_tx) = join(&registry);

        route(&registry, &dev, r#"{"type":"sensor_data","temp":21}"#).await;

        assert_eq!(registry.device_id(), Some(dev.id));
        // "device online" goes to everyone, the promoted sender included
        assert_eq!(statuses(&dev_tx.frames()), vec![STATUS_DEVICE_ONLINE]);
        assert_eq!(statuses(&viewer_tx.frames()), vec![STATUS_DEVICE_ONLINE]);
        // The payload reaches the viewer, not the sender
        assert!(viewer_tx
            .frames()
            .iter()
            .any(|f| f.contains("sensor_data")));
        assert_eq!(dev_tx.frames().len(), 1);

        // A later sensor sender does not usurp the role and triggers no
        // second online broadcast
        route(&registry, &viewer, r#"{"type":"sensor_data","temp":5}"#).await;
        assert_eq!(registry.device_id(), Some(dev.id));
        assert_eq!(statuses(&dev_tx.frames()), vec![STATUS_DEVICE_ONLINE]);
    }

    #[tokio::test]
    async fn sensor_data_never_echoes_to_sender() {
        let registry = Registry::new();
        let (dev, dev_tx) = join(&registry);
        let (_viewer, viewer_tx) = join(&registry);

        let raw = r#"{"type":"sensor_data","humidity":40}"#;
        route(&registry, &dev, raw).await;
        route(&registry, &dev, raw).await;

        assert!(!dev_tx.frames().iter().any(|f| f.contains("humidity")));
        assert_eq!(
            viewer_tx
                .frames()
                .iter()
                .filter(|f| f.contains("humidity"))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn command_is_point_to_point() {
        let registry = Registry::new();
        let (dev, dev_tx) = join(&registry);
        let (viewer, viewer_tx) = join(&registry);
        let (_other, other_tx) = join(&registry);
        registry.promote_to_device(dev.id);

        let raw = r#"{"type":"command","content":"led_on"}"#;
        route(&registry, &viewer, raw).await;

        assert_eq!(dev_tx.frames(), vec![raw.to_string()]);
        assert_eq!(statuses(&viewer_tx.frames()), vec![STATUS_COMMAND_SENT]);
        assert!(other_tx.frames().is_empty());
    }

    #[tokio::test]
    async fn command_without_device_gets_fallback() {
        let registry = Registry::new();
        let (viewer, viewer_tx) = join(&registry);
        let (_other, other_tx) = join(&registry);

        route(&registry, &viewer, r#"{"type":"command","content":"x"}"#).await;

        assert_eq!(
            statuses(&viewer_tx.frames()),
            vec![STATUS_DEVICE_NOT_CONNECTED]
        );
        assert!(other_tx.frames().is_empty());
    }

    #[tokio::test]
    async fn command_to_closed_device_gets_fallback() {
        let registry = Registry::new();
        let (dev, dev_tx) = join(&registry);
        let (viewer, viewer_tx) = join(&registry);
        registry.promote_to_device(dev.id);

        // Device socket dies between lookup and send
        dev_tx.disconnect();
        route(&registry, &viewer, r#"{"type":"command","content":"x"}"#).await;

        assert!(dev_tx.frames().is_empty());
        assert_eq!(
            statuses(&viewer_tx.frames()),
            vec![STATUS_DEVICE_NOT_CONNECTED]
        );
    }

    #[tokio::test]
    async fn chat_fans_out_to_everyone_else() {
        let registry = Registry::new();
        let (dev, dev_tx) = join(&registry);
        let (viewer, viewer_tx) = join(&registry);
        let (_other, other_tx) = join(&registry);
        registry.promote_to_device(dev.id);

        let raw = r#"{"type":"chat_message","content":"hello"}"#;
        route(&registry, &viewer, raw).await;

        // Device is deliberately included in chat fan-out
        assert_eq!(dev_tx.frames(), vec![raw.to_string()]);
        assert_eq!(other_tx.frames(), vec![raw.to_string()]);
        assert!(viewer_tx.frames().is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_echoed_to_sender_only() {
        let registry = Registry::new();
        let (viewer, viewer_tx) = join(&registry);
        let (_other, other_tx) = join(&registry);

        route(&registry, &viewer, r#"{"type":"telemetry_v2"}"#).await;
        assert_eq!(
            statuses(&viewer_tx.frames()),
            vec!["unknown type: telemetry_v2"]
        );
        assert!(other_tx.frames().is_empty());

        // Inbound status_update is server-originated only, so it gets the
        // same treatment
        route(&registry, &viewer, r#"{"type":"status_update","content":"?"}"#).await;
        assert_eq!(
            statuses(&viewer_tx.frames()),
            vec!["unknown type: telemetry_v2", "unknown type: status_update"]
        );
    }

    #[tokio::test]
    async fn malformed_input_is_isolated_to_sender() {
        let registry = Registry::new();
        let (viewer, viewer_tx) = join(&registry);
        let (_other, other_tx) = join(&registry);

        route(&registry, &viewer, "not-json{{").await;

        assert_eq!(viewer_tx.frames().len(), 1);
        assert_eq!(statuses(&viewer_tx.frames()), vec![STATUS_NON_JSON]);
        assert!(other_tx.frames().is_empty());
    }

    #[tokio::test]
    async fn device_slot_clears_and_commands_fall_back() {
        let registry = Registry::new();
        let (dev, _dev_tx) = join(&registry);
        let (viewer, viewer_tx) = join(&registry);

        route(&registry, &dev, r#"{"type":"sensor_data"}"#).await;
        assert_eq!(registry.device_id(), Some(dev.id));

        assert!(registry.unregister(dev.id));
        assert_eq!(registry.device_id(), None);

        route(&registry, &viewer, r#"{"type":"command","content":"x"}"#).await;
        let got = statuses(&viewer_tx.frames());
        assert_eq!(got.last().map(String::as_str), Some(STATUS_DEVICE_NOT_CONNECTED));
    }
}
