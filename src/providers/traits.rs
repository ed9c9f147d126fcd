//! This module defines the interface to the messaging network. The core
//! depends only on this narrow capability surface.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::models::{AccountProfile, ChatKind, InboundMessage};

/// Errors raised by a network session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Opening the network session failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The session credentials could not be loaded.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// The session exists but is not authorized.
    #[error("session not authorized")]
    NotAuthorized,

    /// An outbound send failed.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// A network call failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The inbound event stream has ended.
    #[error("Event stream closed")]
    StreamClosed,
}

/// Identity of the user behind a session.
#[derive(Debug, Clone)]
pub struct SelfInfo {
    /// Telegram user id.
    pub user_id: i64,

    /// Username, when set.
    pub username: Option<String>,

    /// Display name.
    pub display_name: String,
}

/// One chat visible to a session, as returned by dialog enumeration.
#[derive(Debug, Clone)]
pub struct ChatSummary {
    /// Telegram chat id.
    pub chat_id: i64,

    /// Chat title.
    pub name: String,

    /// Kind of the chat.
    pub kind: ChatKind,
}

/// Inbound event delivered by a session's receive loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new message arrived.
    NewMessage(InboundMessage),

    /// An earlier message was edited.
    EditedMessage(InboundMessage),
}

/// Credential pair for one account: the opaque session blob and its metadata
/// document.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    /// Path of the session blob consumed by the network client.
    pub session_file: PathBuf,

    /// Parsed metadata document.
    pub profile: AccountProfile,
}

/// A live authenticated session bound to one account.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Whether the session considers itself connected.
    async fn is_connected(&self) -> bool;

    /// Whether the session is authorized.
    async fn is_authorized(&self) -> Result<bool, SessionError>;

    /// Fetches the identity behind the session.
    async fn get_self(&self) -> Result<SelfInfo, SessionError>;

    /// Enumerates the chats visible to the session. Each call re-enumerates
    /// fully; `limit` bounds the enumeration for sampling callers.
    async fn list_dialogs(&self, limit: Option<usize>)
        -> Result<Vec<ChatSummary>, SessionError>;

    /// Sends a text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SessionError>;

    /// Waits for the next inbound event. Cancellation-safe; callers select
    /// against a shutdown token.
    async fn next_event(&self) -> Result<SessionEvent, SessionError>;

    /// Closes the session. Idempotent.
    async fn disconnect(&self);
}

/// Opens sessions from credential pairs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Opens a connected (not necessarily authorized) session.
    async fn open(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<Arc<dyn SessionClient>, SessionError>;
}
