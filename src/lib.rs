//! Room-based WebSocket Chat Server Library
//!
//! A multi-room chat server built with tokio-tungstenite using the
//! Actor pattern for state management.
//!
//! # Features
//! - WebSocket connection handling
//! - Named rooms joined with a display name
//! - Real-time chat messaging with room-wide fan-out
//! - Location sharing as map links
//! - Live room membership snapshots
//! - Pluggable profanity check on chat text
//! - Disconnection handling with leave notices
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the user directory and
//!   the client registry
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use room_chat_server::{ChatServer, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx));
//!     }
//! }
//! ```

pub mod directory;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod message;
pub mod profanity;
pub mod router;
pub mod server;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use directory::{RoomMember, User, UserDirectory};
pub use envelope::{map_link, Envelope, MessageKind, SYSTEM_SENDER};
pub use error::{AppError, ChatError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ErrorCode, ServerMessage};
pub use profanity::{ProfanityFilter, WordListFilter};
pub use router::{Ack, Router};
pub use server::{ChatServer, ServerCommand};
pub use transport::{ClientRegistry, Outbound};
pub use types::ConnectionId;
