//! A builder for creating `WatchlistEntry` instances in tests.

use crate::models::WatchlistEntry;

/// A builder for creating `WatchlistEntry` instances in tests.
pub struct WatchlistEntryBuilder {
    id: Option<String>,
    tenant_id: Option<String>,
    username: Option<String>,
    user_id: Option<i64>,
    group_ids: Option<Vec<String>>,
    keywords: Option<Vec<String>>,
    destination_ids: Option<Vec<String>>,
    active: Option<bool>,
}

impl Default for WatchlistEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchlistEntryBuilder {
    /// Creates a new `WatchlistEntryBuilder` instance.
    pub fn new() -> Self {
        WatchlistEntryBuilder {
            id: None,
            tenant_id: None,
            username: None,
            user_id: None,
            group_ids: None,
            keywords: None,
            destination_ids: None,
            active: None,
        }
    }

    /// Sets the entry id.
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Sets the tenant id.
    pub fn tenant_id(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    /// Sets the watched username.
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Sets the watched user id.
    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the group scope.
    pub fn group_ids(mut self, group_ids: Vec<String>) -> Self {
        self.group_ids = Some(group_ids);
        self
    }

    /// Sets the keyword filter.
    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Sets the forwarding destinations.
    pub fn destination_ids(mut self, destination_ids: Vec<String>) -> Self {
        self.destination_ids = Some(destination_ids);
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Builds the `WatchlistEntry` instance.
    pub fn build(self) -> WatchlistEntry {
        WatchlistEntry {
            id: self.id.unwrap_or("test-entry".to_string()),
            tenant_id: self.tenant_id.unwrap_or("test-tenant".to_string()),
            username: self.username,
            user_id: self.user_id,
            group_ids: self.group_ids.unwrap_or_default(),
            keywords: self.keywords.unwrap_or_default(),
            destination_ids: self.destination_ids.unwrap_or_default(),
            active: self.active.unwrap_or(true),
        }
    }
}
