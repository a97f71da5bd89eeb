//! Error types for the chat server
//!
//! Defines domain-level chat errors and application-level transport errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Domain-level chat errors
///
/// Recoverable errors reported back to the originating connection only;
/// never broadcast, never fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Username is empty after trimming
    #[error("Username is required")]
    EmptyUsername,

    /// Room name is empty after trimming
    #[error("Room is required")]
    EmptyRoom,

    /// Username already taken in the target room (case-insensitive)
    #[error("Username '{username}' is already in use in room '{room}'")]
    NameTaken { username: String, room: String },

    /// Chat text failed the profanity check
    #[error("Profanity is not allowed!")]
    ProfanityRejected,

    /// Join received on a connection that already joined a room
    #[error("Already joined a room")]
    AlreadyJoined,
}

/// Application-level errors
///
/// Covers fatal per-connection errors in the transport layer
/// (handshake, socket I/O, internal channels).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,
}
