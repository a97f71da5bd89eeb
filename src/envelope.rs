//! Message envelope construction
//!
//! Builds the timestamped envelopes delivered to clients. Pure value
//! construction - content checks happen before an envelope is built.

use serde::Serialize;

/// Reserved sender name for server-authored notices
pub const SYSTEM_SENDER: &str = "Admin";

/// Envelope payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Location,
}

/// Timestamped message unit sent to clients
///
/// Immutable once constructed; transmitted and discarded, never stored.
/// `body` holds chat text for `Text` and a map-link URL for `Location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub kind: MessageKind,
    pub sender: String,
    pub body: String,
    /// Creation time, Unix milliseconds
    pub created_at: i64,
}

impl Envelope {
    /// Build a text envelope stamped with the current time
    pub fn text(sender: &str, body: &str) -> Self {
        Self {
            kind: MessageKind::Text,
            sender: sender.to_string(),
            body: body.to_string(),
            created_at: now_millis(),
        }
    }

    /// Build a location envelope carrying a pre-built map URL
    pub fn location(sender: &str, map_url: &str) -> Self {
        Self {
            kind: MessageKind::Location,
            sender: sender.to_string(),
            body: map_url.to_string(),
            created_at: now_millis(),
        }
    }
}

/// Build a map link URL from a coordinate pair
pub fn map_link(latitude: f64, longitude: f64) -> String {
    format!("https://google.com/maps?q={},{}", latitude, longitude)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
