//! A builder for creating `Group` instances in tests.

use crate::models::{ChatKind, DiscoverySource, Group};

/// A builder for creating `Group` instances in tests.
pub struct GroupBuilder {
    id: Option<String>,
    tenant_id: Option<String>,
    chat_id: Option<i64>,
    name: Option<String>,
    kind: Option<ChatKind>,
    active: Option<bool>,
    source: Option<DiscoverySource>,
}

impl Default for GroupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupBuilder {
    /// Creates a new `GroupBuilder` instance.
    pub fn new() -> Self {
        GroupBuilder {
            id: None,
            tenant_id: None,
            chat_id: None,
            name: None,
            kind: None,
            active: None,
            source: None,
        }
    }

    /// Sets the group id.
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Sets the tenant id.
    pub fn tenant_id(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    /// Sets the external chat id.
    pub fn chat_id(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Sets the group name.
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

    /// Sets the discovery source.
    pub fn source(mut self, source: DiscoverySource) -> Self {
        self.source = Some(source);
        self
    }

    /// Builds the `Group` instance.
    pub fn build(self) -> Group {
        Group {
            id: self.id.unwrap_or("test-group".to_string()),
            tenant_id: self.tenant_id.unwrap_or("test-tenant".to_string()),
            chat_id: self.chat_id.unwrap_or(-100_000),
            name: self.name.unwrap_or("test group".to_string()),
            kind: self.kind.unwrap_or(ChatKind::Supergroup),
            active: self.active.unwrap_or(true),
            source: self.source.unwrap_or(DiscoverySource::Manual),
        }
    }
}
