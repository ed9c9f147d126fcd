//! A builder for creating `InboundMessage` instances in tests.

use chrono::Utc;

use crate::models::{ChatKind, InboundMessage, MediaKind};

/// A builder for creating `InboundMessage` instances in tests.
pub struct MessageBuilder {
    chat_id: Option<i64>,
    chat_name: Option<String>,
    chat_kind: Option<ChatKind>,
    message_id: Option<i64>,
    sender_id: Option<i64>,
    sender_username: Option<String>,
    sender_name: Option<String>,
    text: Option<String>,
    media: Option<MediaKind>,
    edited: bool,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    /// Creates a new `MessageBuilder` instance.
    pub fn new() -> Self {
        MessageBuilder {
            chat_id: None,
            chat_name: None,
            chat_kind: None,
            message_id: None,
            sender_id: None,
            sender_username: None,
            sender_name: None,
            text: None,
            media: None,
            edited: false,
        }
    }

    /// Sets the source chat id.
    pub fn chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Sets the source chat kind.
    pub fn chat_kind(mut self, chat_kind: ChatKind) -> Self {
        self.chat_kind = Some(chat_kind);
        self
    }

    /// Sets the message id.
    pub fn message_id(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Sets the sender user id.
    pub fn sender_id(mut self, sender_id: i64) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    /// Sets the sender username.
    pub fn sender_username(mut self, sender_username: &str) -> Self {
        self.sender_username = Some(sender_username.to_string());
        self
    }

    /// Sets the sender display name.
    pub fn sender_name(mut self, sender_name: &str) -> Self {
        self.sender_name = Some(sender_name.to_string());
        self
    }

    /// Sets the message text.
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Sets the attached media kind.
    pub fn media(mut self, media: MediaKind) -> Self {
        self.media = Some(media);
        self
    }

    /// Marks the message as edited.
    pub fn edited(mut self, edited: bool) -> Self {
        self.edited = edited;
        self
    }

    /// Builds the `InboundMessage` instance.
    pub fn build(self) -> InboundMessage {
        InboundMessage {
            chat_id: self.chat_id.unwrap_or(-100_000),
            chat_name: self.chat_name.unwrap_or("test group".to_string()),
            chat_kind: self.chat_kind.unwrap_or(ChatKind::Supergroup),
            message_id: self.message_id.unwrap_or(1),
            sender_id: self.sender_id,
            sender_username: self.sender_username,
            sender_name: self.sender_name.unwrap_or("Test Sender".to_string()),
            text: self.text.unwrap_or("test message".to_string()),
            media: self.media,
            edited: self.edited,
            received_at: Utc::now(),
        }
    }
}
