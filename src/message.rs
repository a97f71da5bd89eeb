//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization.

use serde::{Deserialize, Serialize};

use crate::directory::RoomMember;
use crate::envelope::Envelope;
use crate::error::ChatError;

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case
/// naming. Disconnection is the socket closing, not a message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room under a display name
    Join { username: String, room: String },
    /// Send a chat message to the current room
    SendMessage { message: String },
    /// Share a position with the current room
    SendLocation { latitude: f64, longitude: f64 },
}

/// Server → Client message
///
/// All messages from server to client. Uses tagged enum with snake_case naming.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Chat or system text envelope
    Message { envelope: Envelope },
    /// Shared-location envelope
    LocationMessage { envelope: Envelope },
    /// Room membership snapshot
    RoomData {
        room: String,
        users: Vec<RoomMember>,
    },
    /// Error occurred; sent to the originating connection only
    Error { code: ErrorCode, message: String },
}

/// Error codes for ServerMessage::Error
///
/// Represents different error scenarios that can be communicated to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Empty username or room on join
    ValidationError,
    /// Username already taken in the target room
    ConflictError,
    /// Chat text failed the content check
    ContentRejected,
    /// Event not valid in the connection's current state
    ProtocolError,
    /// Invalid message format
    InvalidMessage,
}

/// Convert ChatError to ServerMessage for client notification
impl From<ChatError> for ServerMessage {
    fn from(err: ChatError) -> Self {
        let code = match &err {
            ChatError::EmptyUsername | ChatError::EmptyRoom => ErrorCode::ValidationError,
            ChatError::NameTaken { .. } => ErrorCode::ConflictError,
            ChatError::ProfanityRejected => ErrorCode::ContentRejected,
            ChatError::AlreadyJoined => ErrorCode::ProtocolError,
        };
        ServerMessage::Error {
            code,
            message: err.to_string(),
        }
    }
}
