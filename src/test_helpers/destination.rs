//! A builder for creating `ForwardingDestination` instances in tests.

use crate::models::{ChatKind, ForwardingDestination};

/// A builder for creating `ForwardingDestination` instances in tests.
pub struct DestinationBuilder {
    id: Option<String>,
    tenant_id: Option<String>,
    chat_id: Option<i64>,
    name: Option<String>,
    kind: Option<ChatKind>,
    active: Option<bool>,
    source_group_ids: Option<Vec<String>>,
    allowed_usernames: Option<Vec<String>>,
}

impl Default for DestinationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DestinationBuilder {
    /// Creates a new `DestinationBuilder` instance.
    pub fn new() -> Self {
        DestinationBuilder {
            id: None,
            tenant_id: None,
            chat_id: None,
            name: None,
            kind: None,
            active: None,
            source_group_ids: None,
            allowed_usernames: None,
        }
    }

    /// Sets the destination id.
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Sets the tenant id.
    pub fn tenant_id(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    /// Sets the destination chat id.
    pub fn chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Sets the destination name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the chat kind.
    pub fn kind(mut self, kind: ChatKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Sets the source-group filter.
    pub fn source_group_ids(mut self, source_group_ids: Vec<String>) -> Self {
        self.source_group_ids = Some(source_group_ids);
        self
    }

    /// Sets the per-destination user filter.
    pub fn allowed_usernames(mut self, allowed_usernames: Vec<String>) -> Self {
        self.allowed_usernames = Some(allowed_usernames);
        self
    }

    /// Builds the `ForwardingDestination` instance.
    pub fn build(self) -> ForwardingDestination {
        ForwardingDestination {
            id: self.id.unwrap_or("test-destination".to_string()),
            tenant_id: self.tenant_id.unwrap_or("test-tenant".to_string()),
            chat_id: self.chat_id.unwrap_or(-200_000),
            name: self.name.unwrap_or("test destination".to_string()),
            kind: self.kind.unwrap_or(ChatKind::Channel),
            active: self.active.unwrap_or(true),
            message_count: 0,
            last_forwarded: None,
            source_group_ids: self.source_group_ids.unwrap_or_default(),
            allowed_usernames: self.allowed_usernames.unwrap_or_default(),
        }
    }
}
