//! Outbound delivery seam
//!
//! The router core addresses clients through the `Outbound` trait; the
//! production implementation (`ClientRegistry`) holds the per-connection
//! sender channels feeding the WebSocket write tasks.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// Server → client delivery primitive
///
/// Delivery is best-effort and non-blocking: a failed send to one
/// recipient must not abort delivery to others, so implementations
/// swallow per-target failures.
pub trait Outbound {
    /// Deliver a message to a single connection
    fn emit(&mut self, target: ConnectionId, message: ServerMessage);
}

/// Registry of live connection sender channels
///
/// Owns the server-side handle of each connection's outbound queue.
/// A connection is registered when its socket is accepted and removed
/// when it closes; after removal the id is unreachable for good.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    senders: HashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel
    pub fn insert(&mut self, id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        self.senders.insert(id, sender);
    }

    /// Drop a connection's outbound channel
    pub fn remove(&mut self, id: ConnectionId) {
        self.senders.remove(&id);
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Outbound for ClientRegistry {
    fn emit(&mut self, target: ConnectionId, message: ServerMessage) {
        let Some(sender) = self.senders.get(&target) else {
            debug!("Dropping message for unknown connection {}", target);
            return;
        };

        // Fire-and-forget: a full or closed queue loses this message for
        // this one recipient only.
        if let Err(e) = sender.try_send(message) {
            debug!("Dropping message for {}: {}", target, e);
        }
    }
}
