//! ChatServer Actor implementation
//!
//! The central actor owning all shared state: the client registry and
//! the event router with its user directory. Uses the Actor pattern
//! with mpsc channels, so directory access and the read-then-fan-out
//! sequences are serialized without locks; commands from different
//! connections interleave one whole command at a time.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::message::ServerMessage;
use crate::router::{Ack, Router};
use crate::transport::{ClientRegistry, Outbound};
use crate::types::ConnectionId;

/// Commands sent from connection handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        id: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Join a room
    Join {
        id: ConnectionId,
        username: String,
        room: String,
    },
    /// Send a chat message to the current room
    SendMessage {
        id: ConnectionId,
        message: String,
    },
    /// Share a position with the current room
    SendLocation {
        id: ConnectionId,
        latitude: f64,
        longitude: f64,
    },
    /// Client disconnected
    Disconnect {
        id: ConnectionId,
    },
}

/// The main ChatServer actor
///
/// Processes commands from connection handlers one at a time. Error
/// acknowledgments go back to the originating connection only; fan-out
/// goes through the registry's best-effort delivery.
pub struct ChatServer {
    /// Live connection channels
    registry: ClientRegistry,
    /// Event routing over the user directory
    router: Router,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with an empty directory and default filter
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self::with_router(receiver, Router::new(Default::default()))
    }

    /// Create a new ChatServer over a custom router
    pub fn with_router(receiver: mpsc::Receiver<ServerCommand>, router: Router) -> Self {
        Self {
            registry: ClientRegistry::new(),
            router,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders
    /// are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { id, sender } => {
                self.handle_connect(id, sender);
            }
            ServerCommand::Join { id, username, room } => {
                let ack = self.router.join(&mut self.registry, id, &username, &room);
                self.acknowledge(id, ack);
            }
            ServerCommand::SendMessage { id, message } => {
                let ack = self.router.send_message(&mut self.registry, id, &message);
                self.acknowledge(id, ack);
            }
            ServerCommand::SendLocation {
                id,
                latitude,
                longitude,
            } => {
                let ack = self
                    .router
                    .send_location(&mut self.registry, id, latitude, longitude);
                self.acknowledge(id, ack);
            }
            ServerCommand::Disconnect { id } => {
                self.handle_disconnect(id);
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        info!("Client {} connected", id);
        self.registry.insert(id, sender);
        debug!("Total connections: {}", self.registry.len());
    }

    /// Handle client disconnection
    ///
    /// Routes the leave fan-out while the remaining members are still
    /// reachable, then drops the connection's channel for good.
    fn handle_disconnect(&mut self, id: ConnectionId) {
        info!("Client {} disconnected", id);

        self.router.disconnect(&mut self.registry, id);
        self.registry.remove(id);

        debug!("Total connections: {}", self.registry.len());
    }

    /// Mirror an acknowledgment back to the originating connection
    ///
    /// Only errors travel on the wire; success and the no-ack case are
    /// silent.
    fn acknowledge(&mut self, id: ConnectionId, ack: Ack) {
        match ack {
            Ack::Ok | Ack::None => {}
            Ack::Err(err) => {
                debug!("Rejecting event from {}: {}", id, err);
                self.registry.emit(id, err.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::message::ErrorCode;

    fn start_server() -> mpsc::Sender<ServerCommand> {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        tokio::spawn(ChatServer::new(cmd_rx).run());
        cmd_tx
    }

    async fn connect(
        cmd_tx: &mpsc::Sender<ServerCommand>,
    ) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(64);
        cmd_tx
            .send(ServerCommand::Connect { id, sender: tx })
            .await
            .unwrap();
        (id, rx)
    }

    fn expect_envelope(msg: ServerMessage) -> Envelope {
        match msg {
            ServerMessage::Message { envelope } => envelope,
            other => panic!("Expected text message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_flow_over_channels() {
        let cmd_tx = start_server();
        let (a, mut a_rx) = connect(&cmd_tx).await;

        cmd_tx
            .send(ServerCommand::Join {
                id: a,
                username: "A".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();

        let welcome = expect_envelope(a_rx.recv().await.unwrap());
        assert_eq!(welcome.sender, "Admin");
        assert_eq!(welcome.body, "Welcome!");

        match a_rx.recv().await.unwrap() {
            ServerMessage::RoomData { room, users } => {
                assert_eq!(room, "r1");
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].username, "A");
            }
            other => panic!("Expected room data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_reaches_both_members() {
        let cmd_tx = start_server();
        let (a, mut a_rx) = connect(&cmd_tx).await;
        let (b, mut b_rx) = connect(&cmd_tx).await;

        cmd_tx
            .send(ServerCommand::Join {
                id: a,
                username: "A".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Join {
                id: b,
                username: "B".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();

        // Drain A: welcome, snapshot, B's join notice, second snapshot
        for _ in 0..4 {
            a_rx.recv().await.unwrap();
        }
        // Drain B: welcome, snapshot
        for _ in 0..2 {
            b_rx.recv().await.unwrap();
        }

        cmd_tx
            .send(ServerCommand::SendMessage {
                id: a,
                message: "hello".to_string(),
            })
            .await
            .unwrap();

        for rx in [&mut a_rx, &mut b_rx] {
            let envelope = expect_envelope(rx.recv().await.unwrap());
            assert_eq!(envelope.sender, "A");
            assert_eq!(envelope.body, "hello");
        }
    }

    #[tokio::test]
    async fn test_validation_error_is_acknowledged_to_sender() {
        let cmd_tx = start_server();
        let (a, mut a_rx) = connect(&cmd_tx).await;

        cmd_tx
            .send(ServerCommand::Join {
                id: a,
                username: "  ".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();

        match a_rx.recv().await.unwrap() {
            ServerMessage::Error { code, message } => {
                assert!(matches!(code, ErrorCode::ValidationError));
                assert_eq!(message, "Username is required");
            }
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unjoined_send_produces_no_reply() {
        let cmd_tx = start_server();
        let (a, mut a_rx) = connect(&cmd_tx).await;

        // No user record yet, so this send is silently dropped with no
        // acknowledgment of any kind.
        cmd_tx
            .send(ServerCommand::SendMessage {
                id: a,
                message: "hello".to_string(),
            })
            .await
            .unwrap();

        // A subsequent join's welcome is the first thing A ever receives
        cmd_tx
            .send(ServerCommand::Join {
                id: a,
                username: "A".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();

        let first = expect_envelope(a_rx.recv().await.unwrap());
        assert_eq!(first.body, "Welcome!");
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remaining() {
        let cmd_tx = start_server();
        let (a, mut a_rx) = connect(&cmd_tx).await;
        let (b, mut b_rx) = connect(&cmd_tx).await;

        cmd_tx
            .send(ServerCommand::Join {
                id: a,
                username: "A".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();
        cmd_tx
            .send(ServerCommand::Join {
                id: b,
                username: "B".to_string(),
                room: "r1".to_string(),
            })
            .await
            .unwrap();

        for _ in 0..4 {
            a_rx.recv().await.unwrap();
        }
        for _ in 0..2 {
            b_rx.recv().await.unwrap();
        }

        cmd_tx
            .send(ServerCommand::Disconnect { id: b })
            .await
            .unwrap();

        let notice = expect_envelope(a_rx.recv().await.unwrap());
        assert_eq!(notice.sender, "Admin");
        assert_eq!(notice.body, "B has left!");

        match a_rx.recv().await.unwrap() {
            ServerMessage::RoomData { users, .. } => {
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].username, "A");
            }
            other => panic!("Expected room data, got {:?}", other),
        }

        // B's channel is dropped by the server after the disconnect
        assert!(b_rx.recv().await.is_none());
    }
}
