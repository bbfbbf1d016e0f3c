//! In-memory transport pieces used by unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use pylon_transport::{Result, TransportError, TransportSender};
use std::sync::Arc;

/// Records every frame sent through it; can be flipped closed to simulate
/// a peer that went away mid-routing.
pub struct RecordingSender {
    sent: Mutex<Vec<String>>,
    open: Mutex<bool>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            open: Mutex::new(true),
        })
    }

    pub fn frames(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn disconnect(&self) {
        *self.open.lock() = false;
    }
}

#[async_trait]
impl TransportSender for RecordingSender {
    async fn send(&self, text: String) -> Result<()> {
        if !*self.open.lock() {
            return Err(TransportError::NotConnected);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.open.lock()
    }

    async fn close(&self, _code: u16, _reason: &str) -> Result<()> {
        *self.open.lock() = false;
        Ok(())
    }
}
