//! User directory
//!
//! In-memory registry of joined users, keyed by connection ID, with an
//! indexed room multimap for membership listings and fan-out.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ChatError;
use crate::types::ConnectionId;

/// One active participant
///
/// Created on a successful join, immutable afterwards (no rename or
/// room change), removed on disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Connection this user is bound to
    pub id: ConnectionId,
    /// Display name, trimmed, original case preserved
    pub username: String,
    /// Room label, trimmed, original case preserved
    pub room: String,
}

/// Membership-view element sent in room snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomMember {
    pub username: String,
}

/// In-memory user registry
///
/// Owns all `User` records for their full lifetime. Rooms are not stored
/// entities: a room exists exactly while at least one user references it.
/// The `rooms` index maps a lowercased room label to its member
/// connections in join order, giving O(1) fan-out lookups and
/// deterministic member listings.
#[derive(Debug, Default)]
pub struct UserDirectory {
    /// All joined users: ConnectionId -> User
    users: HashMap<ConnectionId, User>,
    /// Room index: lowercased room label -> members in join order
    rooms: HashMap<String, Vec<ConnectionId>>,
}

impl UserDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to the directory
    ///
    /// Trims `username` and `room`; both must be non-empty after
    /// trimming. The (username, room) pair must be unique under
    /// case-insensitive comparison. Returns the stored record on
    /// success; on any error the directory is left unchanged.
    pub fn add_user(
        &mut self,
        id: ConnectionId,
        username: &str,
        room: &str,
    ) -> Result<&User, ChatError> {
        let username = username.trim();
        let room = room.trim();

        if username.is_empty() {
            return Err(ChatError::EmptyUsername);
        }
        if room.is_empty() {
            return Err(ChatError::EmptyRoom);
        }

        let room_key = room.to_lowercase();
        let username_key = username.to_lowercase();

        let taken = self
            .rooms
            .get(&room_key)
            .map(|members| {
                members.iter().any(|member_id| {
                    self.users
                        .get(member_id)
                        .is_some_and(|u| u.username.to_lowercase() == username_key)
                })
            })
            .unwrap_or(false);

        if taken {
            return Err(ChatError::NameTaken {
                username: username.to_string(),
                room: room.to_string(),
            });
        }

        let user = User {
            id,
            username: username.to_string(),
            room: room.to_string(),
        };
        self.rooms.entry(room_key).or_default().push(id);
        self.users.insert(id, user);
        Ok(&self.users[&id])
    }

    /// Remove and return the user for `id`
    ///
    /// Returns `None` when the id is unknown - a normal case (double
    /// disconnect, or a connection that never joined). An emptied room
    /// disappears from the index with its last member.
    pub fn remove_user(&mut self, id: ConnectionId) -> Option<User> {
        let user = self.users.remove(&id)?;

        let room_key = user.room.to_lowercase();
        if let Some(members) = self.rooms.get_mut(&room_key) {
            members.retain(|member_id| *member_id != id);
            if members.is_empty() {
                self.rooms.remove(&room_key);
            }
        }

        Some(user)
    }

    /// Look up the user for `id`
    pub fn get_user(&self, id: ConnectionId) -> Option<&User> {
        self.users.get(&id)
    }

    /// List the members of a room in join order
    ///
    /// Room match is case-insensitive. An unknown or empty room yields
    /// an empty list, never an error.
    pub fn users_in_room(&self, room: &str) -> Vec<RoomMember> {
        self.connections_in_room(room)
            .iter()
            .filter_map(|id| self.users.get(id))
            .map(|user| RoomMember {
                username: user.username.clone(),
            })
            .collect()
    }

    /// Connections subscribed to a room, in join order
    ///
    /// The fan-out index; same ordering as `users_in_room`.
    pub fn connections_in_room(&self, room: &str) -> &[ConnectionId] {
        self.rooms
            .get(&room.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_user_stores_trimmed_values() {
        let mut directory = UserDirectory::new();
        let id = ConnectionId::new();

        let user = directory.add_user(id, "  Alice  ", "  Lobby ").unwrap();
        assert_eq!(user.username, "Alice");
        assert_eq!(user.room, "Lobby");

        let stored = directory.get_user(id).unwrap();
        assert_eq!(stored.username, "Alice");
        assert_eq!(stored.room, "Lobby");
    }

    #[test]
    fn test_add_user_rejects_empty_username() {
        let mut directory = UserDirectory::new();

        let err = directory
            .add_user(ConnectionId::new(), "   ", "lobby")
            .unwrap_err();
        assert_eq!(err, ChatError::EmptyUsername);
    }

    #[test]
    fn test_add_user_rejects_empty_room() {
        let mut directory = UserDirectory::new();

        let err = directory
            .add_user(ConnectionId::new(), "bob", "  ")
            .unwrap_err();
        assert_eq!(err, ChatError::EmptyRoom);
    }

    #[test]
    fn test_add_user_rejects_case_insensitive_duplicate() {
        let mut directory = UserDirectory::new();
        directory
            .add_user(ConnectionId::new(), "Bob", "Lobby")
            .unwrap();

        let err = directory
            .add_user(ConnectionId::new(), "bob", "lobby")
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::NameTaken {
                username: "bob".to_string(),
                room: "lobby".to_string(),
            }
        );

        // Directory unchanged
        assert_eq!(directory.users_in_room("lobby").len(), 1);
    }

    #[test]
    fn test_same_username_allowed_in_different_rooms() {
        let mut directory = UserDirectory::new();
        directory
            .add_user(ConnectionId::new(), "Bob", "room-a")
            .unwrap();
        directory
            .add_user(ConnectionId::new(), "Bob", "room-b")
            .unwrap();

        assert_eq!(directory.users_in_room("room-a").len(), 1);
        assert_eq!(directory.users_in_room("room-b").len(), 1);
    }

    #[test]
    fn test_users_in_room_empty_room() {
        let directory = UserDirectory::new();
        assert!(directory.users_in_room("nowhere").is_empty());
        assert!(directory.connections_in_room("nowhere").is_empty());
    }

    #[test]
    fn test_users_in_room_join_order() {
        let mut directory = UserDirectory::new();
        directory
            .add_user(ConnectionId::new(), "Alice", "lobby")
            .unwrap();
        directory
            .add_user(ConnectionId::new(), "Bob", "lobby")
            .unwrap();
        directory
            .add_user(ConnectionId::new(), "Carol", "lobby")
            .unwrap();

        let names: Vec<_> = directory
            .users_in_room("lobby")
            .into_iter()
            .map(|m| m.username)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_users_in_room_case_insensitive_match() {
        let mut directory = UserDirectory::new();
        directory
            .add_user(ConnectionId::new(), "Alice", "Lobby")
            .unwrap();

        assert_eq!(directory.users_in_room("LOBBY").len(), 1);
        assert_eq!(directory.users_in_room("lobby").len(), 1);
    }

    #[test]
    fn test_remove_user_present() {
        let mut directory = UserDirectory::new();
        let id = ConnectionId::new();
        directory.add_user(id, "Alice", "lobby").unwrap();

        let removed = directory.remove_user(id).unwrap();
        assert_eq!(removed.username, "Alice");

        assert!(directory.get_user(id).is_none());
        assert!(directory.users_in_room("lobby").is_empty());
    }

    #[test]
    fn test_remove_user_unknown_id() {
        let mut directory = UserDirectory::new();
        directory
            .add_user(ConnectionId::new(), "Alice", "lobby")
            .unwrap();

        assert!(directory.remove_user(ConnectionId::new()).is_none());
        assert_eq!(directory.users_in_room("lobby").len(), 1);
    }

    #[test]
    fn test_room_disappears_with_last_member() {
        let mut directory = UserDirectory::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        directory.add_user(a, "Alice", "lobby").unwrap();
        directory.add_user(b, "Bob", "lobby").unwrap();

        directory.remove_user(a);
        let names: Vec<_> = directory
            .users_in_room("lobby")
            .into_iter()
            .map(|m| m.username)
            .collect();
        assert_eq!(names, vec!["Bob"]);

        directory.remove_user(b);
        assert!(directory.connections_in_room("lobby").is_empty());
        // The emptied room's name is free for a fresh conflict check
        directory.add_user(ConnectionId::new(), "Alice", "lobby").unwrap();
    }
}
