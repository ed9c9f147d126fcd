//! This module defines the `Group` record, a monitored chat scoped to a
//! tenant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::ChatKind;

/// How a group entered the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// Created by an operator through seed configuration or the API layer.
    Manual,
    /// Auto-registered by group discovery.
    Auto,
}

/// A monitored chat. `(tenant_id, chat_id)` is unique among active groups;
/// groups are soft-deleted by clearing `active`, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Store id.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Telegram chat id.
    pub chat_id: i64,

    /// Chat title at discovery time.
    pub name: String,

    /// Kind of the chat.
    pub kind: ChatKind,

    /// Soft-delete flag.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Whether the group was added manually or auto-discovered.
    pub source: DiscoverySource,
}

fn default_active() -> bool {
    true
}

impl Group {
    /// Creates a group registered by discovery.
    pub fn discovered(tenant_id: &str, chat_id: i64, name: &str, kind: ChatKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            chat_id,
            name: name.to_string(),
            kind,
            active: true,
            source: DiscoverySource::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovered_groups_are_active_and_auto() {
        let group = Group::discovered("tenant-a", -100123, "ops", ChatKind::Supergroup);
        assert!(group.active);
        assert_eq!(group.source, DiscoverySource::Auto);
        assert!(!group.id.is_empty());
    }
}
