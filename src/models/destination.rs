//! This module defines the `ForwardingDestination` record, a tenant-scoped
//! outbound target chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::ChatKind;

/// An outbound target that receives formatted alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingDestination {
    /// Store id.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Telegram chat id alerts are sent to.
    pub chat_id: i64,

    /// Operator-facing name.
    pub name: String,

    /// Kind of the destination chat.
    pub kind: ChatKind,

    /// Soft-delete flag.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Cumulative count of messages forwarded here.
    #[serde(default)]
    pub message_count: u64,

    /// When the last forward succeeded.
    #[serde(default)]
    pub last_forwarded: Option<DateTime<Utc>>,

    /// Source-group filter: only messages from these group ids are accepted.
    /// Empty means no restriction.
    #[serde(default)]
    pub source_group_ids: Vec<String>,

    /// Per-destination sender filter by username. Empty means no restriction.
    #[serde(default)]
    pub allowed_usernames: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl ForwardingDestination {
    /// Whether this destination accepts messages from the given group/sender,
    /// applying the optional source-group and user filters.
    pub fn accepts(&self, group_id: &str, sender_username: Option<&str>) -> bool {
        let group_ok =
            self.source_group_ids.is_empty() || self.source_group_ids.iter().any(|g| g == group_id);
        let user_ok = self.allowed_usernames.is_empty()
            || sender_username
                .map(|u| self.allowed_usernames.iter().any(|a| a.eq_ignore_ascii_case(u)))
                .unwrap_or(false);
        group_ok && user_ok
    }
}
