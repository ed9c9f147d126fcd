//! Normalized inbound message record and the chat/media classifications that
//! come with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of chat an event or destination refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-on-one conversation; never monitored.
    Private,
    /// Basic group.
    Group,
    /// Megagroup.
    Supergroup,
    /// Broadcast channel.
    Channel,
}

impl ChatKind {
    /// Whether messages from this kind of chat are eligible for monitoring.
    pub fn is_monitorable(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup | ChatKind::Channel)
    }
}

/// Coarse media classification attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A photo.
    Photo,
    /// A generic document or file attachment.
    Document,
    /// A sticker.
    Sticker,
    /// A shared contact.
    Contact,
    /// A poll.
    Poll,
    /// A geo point, live location or venue.
    Location,
    /// Anything else the client reports.
    Other,
}

impl MediaKind {
    /// Human-readable label used in formatted alerts.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Document => "document",
            MediaKind::Sticker => "sticker",
            MediaKind::Contact => "contact",
            MediaKind::Poll => "poll",
            MediaKind::Location => "location",
            MediaKind::Other => "other",
        }
    }
}

/// A message event after extraction of the fields the pipeline cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Telegram chat id the message arrived in.
    pub chat_id: i64,

    /// Chat title at the time of receipt.
    pub chat_name: String,

    /// Kind of the source chat.
    pub chat_kind: ChatKind,

    /// Message id within the chat.
    pub message_id: i64,

    /// Sender user id, when the sender is visible.
    pub sender_id: Option<i64>,

    /// Sender username without the leading `@`, when set.
    pub sender_username: Option<String>,

    /// Sender display name; empty for anonymous posts.
    pub sender_name: String,

    /// Message text or caption.
    pub text: String,

    /// Attached media, if any.
    pub media: Option<MediaKind>,

    /// True when this event is an edit of an earlier message.
    pub edited: bool,

    /// When the event was received.
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_chats_are_not_monitorable() {
        assert!(!ChatKind::Private.is_monitorable());
        assert!(ChatKind::Group.is_monitorable());
        assert!(ChatKind::Supergroup.is_monitorable());
        assert!(ChatKind::Channel.is_monitorable());
    }

    #[test]
    fn chat_kind_round_trips_snake_case() {
        let kind: ChatKind = serde_json::from_str("\"supergroup\"").unwrap();
        assert_eq!(kind, ChatKind::Supergroup);
    }
}
