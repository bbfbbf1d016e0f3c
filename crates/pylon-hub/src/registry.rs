//! Connection registry
//!
//! Tracks the set of open connections plus the single privileged device
//! slot. Invariant: a non-empty slot always names a member of the open
//! set; `unregister` clears it the moment that member leaves, and
//! `promote_to_device` refuses ids that are not currently registered.

use dashmap::DashMap;
use parking_lot::Mutex;
use pylon_transport::TransportSender;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::connection::{Connection, ConnectionId};

/// Registry of open connections and the device slot
pub struct Registry {
    /// All open connections
    connections: DashMap<ConnectionId, Arc<Connection>>,
    /// The privileged device connection, if any.
    /// Mutex-guarded so promotion is one indivisible check-and-set.
    device: Mutex<Option<ConnectionId>>,
    /// Next connection id
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            device: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a newly opened connection. No role is assigned.
    pub fn register(&self, addr: SocketAddr, sender: Arc<dyn TransportSender>) -> Arc<Connection> {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let conn = Arc::new(Connection::new(id, addr, sender));
        self.connections.insert(id, conn.clone());
        conn
    }

    /// Remove a connection from the open set.
    ///
    /// Returns true when the connection held the device role, so the
    /// caller can notify survivors. Idempotent: a second call for the same
    /// id is a no-op returning false.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        if self.connections.remove(&id).is_none() {
            return false;
        }
        let mut device = self.device.lock();
        if *device == Some(id) {
            *device = None;
            return true;
        }
        false
    }

    /// Promote a connection to the device role, first-writer-wins.
    ///
    /// Returns whether promotion occurred: false when the slot is already
    /// taken (a later sensor sender never usurps it) or when the id is no
    /// longer registered.
    pub fn promote_to_device(&self, id: ConnectionId) -> bool {
        let mut device = self.device.lock();
        if device.is_some() || !self.connections.contains_key(&id) {
            return false;
        }
        *device = Some(id);
        true
    }

    /// The current device connection, if any.
    ///
    /// Callers re-check `is_open()` before writing: a close may race the
    /// lookup, in which case the send is simply dropped.
    pub fn device(&self) -> Option<Arc<Connection>> {
        let id = (*self.device.lock())?;
        self.connections.get(&id).map(|c| Arc::clone(c.value()))
    }

    /// Identity of the current device connection, if any
    pub fn device_id(&self) -> Option<ConnectionId> {
        *self.device.lock()
    }

    /// Snapshot of the open set, safe to iterate while connections join
    /// and leave concurrently.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect()
    }

    /// Number of open connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
