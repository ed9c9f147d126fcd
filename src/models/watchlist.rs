//! This module defines the `WatchlistEntry` rule: who to watch, where, with
//! what keyword filter, and where to forward matches.

use serde::{Deserialize, Serialize};

/// A tenant-scoped monitoring rule. At least one of `username` / `user_id`
/// must be set; the seed loader rejects entries that set neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Store id.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Username to watch, matched case-insensitively, without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,

    /// Telegram user id to watch.
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Group ids the rule is scoped to; empty means every group of the tenant.
    #[serde(default)]
    pub group_ids: Vec<String>,

    /// Keywords the message text must match (plain or regex). Empty means any
    /// text matches.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Destinations to forward matches to.
    #[serde(default)]
    pub destination_ids: Vec<String>,

    /// Whether the rule is evaluated.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl WatchlistEntry {
    /// Whether this rule watches the given sender.
    pub fn matches_sender(&self, sender_id: Option<i64>, sender_username: Option<&str>) -> bool {
        if let (Some(watched), Some(seen)) = (self.user_id, sender_id) {
            if watched == seen {
                return true;
            }
        }
        if let (Some(watched), Some(seen)) = (self.username.as_deref(), sender_username) {
            if watched.eq_ignore_ascii_case(seen) {
                return true;
            }
        }
        false
    }

    /// Whether the rule applies in the given group.
    pub fn in_scope(&self, group_id: &str) -> bool {
        self.group_ids.is_empty() || self.group_ids.iter().any(|id| id == group_id)
    }
}
