//! Connection event router
//!
//! Per-connection event handling: join, chat, location sharing, and
//! disconnect. Mutates the user directory, builds envelopes, and fans
//! them out through the `Outbound` delivery seam. A connection is
//! considered joined exactly while the directory holds its record.

use crate::directory::UserDirectory;
use crate::envelope::{map_link, Envelope, SYSTEM_SENDER};
use crate::error::ChatError;
use crate::message::ServerMessage;
use crate::profanity::{ProfanityFilter, WordListFilter};
use crate::transport::Outbound;
use crate::types::ConnectionId;

/// Acknowledgment for one handled inbound event
///
/// Mirrored back to the event's originating connection: `Err` becomes a
/// wire error, `Ok` completes silently. `None` means the handler
/// finished without acknowledging at all - only the send paths produce
/// it, when the connection has no directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Ok,
    Err(ChatError),
    None,
}

/// Routes inbound connection events
///
/// Owns the injected user directory and the content check; holds no
/// other state. All emissions for one event are computed against the
/// directory state left by that event's own mutation, so every
/// recipient sees a consistent membership view.
pub struct Router {
    directory: UserDirectory,
    filter: Box<dyn ProfanityFilter>,
}

impl Router {
    /// Create a router over the given directory with the default filter
    pub fn new(directory: UserDirectory) -> Self {
        Self::with_filter(directory, Box::new(WordListFilter::default()))
    }

    /// Create a router with a custom content check
    pub fn with_filter(directory: UserDirectory, filter: Box<dyn ProfanityFilter>) -> Self {
        Self { directory, filter }
    }

    /// The underlying user directory
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Handle a join request
    ///
    /// A second join on an already-joined connection is a protocol
    /// error and mutates nothing. Validation and conflict errors come
    /// back from the directory untouched. On success the joiner gets a
    /// welcome notice, the rest of the room a join notice, and the
    /// whole room (joiner included) a fresh membership snapshot.
    pub fn join(
        &mut self,
        out: &mut dyn Outbound,
        id: ConnectionId,
        username: &str,
        room: &str,
    ) -> Ack {
        if self.directory.get_user(id).is_some() {
            return Ack::Err(ChatError::AlreadyJoined);
        }

        let user = match self.directory.add_user(id, username, room) {
            Ok(user) => user.clone(),
            Err(e) => return Ack::Err(e),
        };

        out.emit(
            id,
            ServerMessage::Message {
                envelope: Envelope::text(SYSTEM_SENDER, "Welcome!"),
            },
        );
        self.emit_to_room_excluding(
            out,
            &user.room,
            id,
            ServerMessage::Message {
                envelope: Envelope::text(
                    SYSTEM_SENDER,
                    &format!("{} has joined!", user.username),
                ),
            },
        );
        self.emit_room_data(out, &user.room);

        Ack::Ok
    }

    /// Handle a chat message
    ///
    /// Rejected text emits nothing. When the connection has no
    /// directory record the handler no-ops without acknowledging -
    /// the sender cannot tell this apart from success on the wire.
    pub fn send_message(&mut self, out: &mut dyn Outbound, id: ConnectionId, text: &str) -> Ack {
        if self.filter.is_profane(text) {
            return Ack::Err(ChatError::ProfanityRejected);
        }

        let Some(user) = self.directory.get_user(id) else {
            return Ack::None;
        };
        let (username, room) = (user.username.clone(), user.room.clone());

        self.emit_to_room(
            out,
            &room,
            ServerMessage::Message {
                envelope: Envelope::text(&username, text),
            },
        );

        Ack::Ok
    }

    /// Handle a shared location
    ///
    /// Same missing-record guard as `send_message`; coordinates are
    /// folded into a map link and fanned out to the whole room.
    pub fn send_location(
        &mut self,
        out: &mut dyn Outbound,
        id: ConnectionId,
        latitude: f64,
        longitude: f64,
    ) -> Ack {
        let Some(user) = self.directory.get_user(id) else {
            return Ack::None;
        };
        let (username, room) = (user.username.clone(), user.room.clone());

        self.emit_to_room(
            out,
            &room,
            ServerMessage::LocationMessage {
                envelope: Envelope::location(&username, &map_link(latitude, longitude)),
            },
        );

        Ack::Ok
    }

    /// Handle a closed connection
    ///
    /// No acknowledgment. When the connection had joined, the remaining
    /// members get a leave notice and an updated snapshot; otherwise
    /// nothing is emitted.
    pub fn disconnect(&mut self, out: &mut dyn Outbound, id: ConnectionId) {
        let Some(user) = self.directory.remove_user(id) else {
            return;
        };

        self.emit_to_room(
            out,
            &user.room,
            ServerMessage::Message {
                envelope: Envelope::text(SYSTEM_SENDER, &format!("{} has left!", user.username)),
            },
        );
        self.emit_room_data(out, &user.room);
    }

    /// Deliver a message to every connection in a room
    fn emit_to_room(&self, out: &mut dyn Outbound, room: &str, message: ServerMessage) {
        for target in self.directory.connections_in_room(room) {
            out.emit(*target, message.clone());
        }
    }

    /// Deliver a message to every connection in a room except one
    fn emit_to_room_excluding(
        &self,
        out: &mut dyn Outbound,
        room: &str,
        skip: ConnectionId,
        message: ServerMessage,
    ) {
        for target in self.directory.connections_in_room(room) {
            if *target != skip {
                out.emit(*target, message.clone());
            }
        }
    }

    /// Deliver the current membership snapshot to a whole room
    fn emit_room_data(&self, out: &mut dyn Outbound, room: &str) {
        let snapshot = ServerMessage::RoomData {
            room: room.to_string(),
            users: self.directory.users_in_room(room),
        };
        self.emit_to_room(out, room, snapshot);
    }
}
