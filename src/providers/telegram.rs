//! Telegram implementation of the session provider, backed by grammers.
//! Only this module touches the client crate; everything else stays behind
//! the provider traits.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use grammers_client::{
    types::{Chat, Media, Message},
    Client, Config, InitParams, Update,
};
use grammers_session::{PackedChat, Session};

use super::traits::{
    AccountCredentials, ChatSummary, SelfInfo, SessionClient, SessionError, SessionEvent,
    SessionProvider,
};
use crate::models::{ChatKind, InboundMessage, MediaKind};

/// Opens Telegram user sessions from stored session blobs.
pub struct TelegramSessionProvider {
    api_id: i32,
    api_hash: String,
}

impl TelegramSessionProvider {
    /// Creates a provider for the given Telegram application credentials.
    pub fn new(api_id: i32, api_hash: String) -> Self {
        Self { api_id, api_hash }
    }
}

#[async_trait]
impl SessionProvider for TelegramSessionProvider {
    async fn open(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<Arc<dyn SessionClient>, SessionError> {
        let session = Session::load_file_or_create(&credentials.session_file)
            .map_err(|e| SessionError::Credentials(e.to_string()))?;

        let client = Client::connect(Config {
            session,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| SessionError::ConnectionFailed(e.to_string()))?;

        tracing::debug!(
            phone_number = %credentials.profile.phone_number,
            "Telegram session connected."
        );

        Ok(Arc::new(TelegramSessionClient {
            client,
            connected: AtomicBool::new(true),
            chats: DashMap::new(),
        }))
    }
}

/// A live grammers client plus the packed-chat cache needed to address chats
/// by bare id when sending.
pub struct TelegramSessionClient {
    client: Client,
    connected: AtomicBool,
    chats: DashMap<i64, PackedChat>,
}

impl TelegramSessionClient {
    fn remember_chat(&self, chat: &Chat) {
        self.chats.insert(chat.id(), chat.pack());
    }

    fn summarize(&self, chat: &Chat) -> ChatSummary {
        self.remember_chat(chat);
        ChatSummary {
            chat_id: chat.id(),
            name: chat.name().to_string(),
            kind: classify_chat(chat),
        }
    }

    fn normalize(&self, message: &Message, edited: bool) -> InboundMessage {
        let chat = message.chat();
        self.remember_chat(&chat);
        let sender = message.sender();
        InboundMessage {
            chat_id: chat.id(),
            chat_name: chat.name().to_string(),
            chat_kind: classify_chat(&chat),
            message_id: i64::from(message.id()),
            sender_id: sender.as_ref().map(|s| s.id()),
            sender_username: sender.as_ref().and_then(|s| s.username()).map(str::to_string),
            sender_name: sender.as_ref().map(|s| s.name().to_string()).unwrap_or_default(),
            text: message.text().to_string(),
            media: message.media().map(|m| classify_media(&m)),
            edited,
            received_at: message.date(),
        }
    }
}

fn classify_chat(chat: &Chat) -> ChatKind {
    match chat {
        Chat::User(_) => ChatKind::Private,
        Chat::Group(_) => ChatKind::Group,
        Chat::Channel(_) => ChatKind::Channel,
    }
}

fn classify_media(media: &Media) -> MediaKind {
    match media {
        Media::Photo(_) => MediaKind::Photo,
        Media::Sticker(_) => MediaKind::Sticker,
        Media::Document(_) => MediaKind::Document,
        Media::Contact(_) => MediaKind::Contact,
        Media::Poll(_) => MediaKind::Poll,
        Media::Geo(_) | Media::GeoLive(_) | Media::Venue(_) => MediaKind::Location,
        _ => MediaKind::Other,
    }
}

#[async_trait]
impl SessionClient for TelegramSessionClient {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn is_authorized(&self) -> Result<bool, SessionError> {
        self.client.is_authorized().await.map_err(|e| SessionError::Network(e.to_string()))
    }

    async fn get_self(&self) -> Result<SelfInfo, SessionError> {
        let me = self.client.get_me().await.map_err(|e| SessionError::Network(e.to_string()))?;
        Ok(SelfInfo {
            user_id: me.id(),
            username: me.username().map(str::to_string),
            display_name: me.full_name(),
        })
    }

    async fn list_dialogs(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatSummary>, SessionError> {
        let mut dialogs = self.client.iter_dialogs();
        if let Some(limit) = limit {
            dialogs = dialogs.limit(limit);
        }
        let mut chats = Vec::new();
        while let Some(dialog) =
            dialogs.next().await.map_err(|e| SessionError::Network(e.to_string()))?
        {
            chats.push(self.summarize(dialog.chat()));
        }
        Ok(chats)
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SessionError> {
        let packed = match self.chats.get(&chat_id) {
            Some(packed) => *packed,
            None => {
                // The chat has not been seen yet on this session; a dialog
                // sweep fills the cache.
                self.list_dialogs(None).await?;
                *self
                    .chats
                    .get(&chat_id)
                    .ok_or_else(|| {
                        SessionError::SendFailed(format!("chat {chat_id} is not reachable"))
                    })?
            }
        };
        self.client
            .send_message(packed, text)
            .await
            .map_err(|e| SessionError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn next_event(&self) -> Result<SessionEvent, SessionError> {
        loop {
            match self.client.next_update().await {
                Ok(Update::NewMessage(message)) if !message.outgoing() => {
                    return Ok(SessionEvent::NewMessage(self.normalize(&message, false)));
                }
                Ok(Update::MessageEdited(message)) if !message.outgoing() => {
                    return Ok(SessionEvent::EditedMessage(self.normalize(&message, true)));
                }
                Ok(_) => continue,
                Err(e) => {
                    self.connected.store(false, Ordering::Relaxed);
                    return Err(SessionError::Network(e.to_string()));
                }
            }
        }
    }

    async fn disconnect(&self) {
        // grammers closes the connection when the last clone of the client
        // drops; marking the handle disconnected stops health probes from
        // treating it as live in the meantime.
        self.connected.store(false, Ordering::Relaxed);
    }
}
