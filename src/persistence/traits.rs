//! The session store interface. Persistence technology is a collaborator
//! concern; the core only depends on these find/insert/update/count
//! semantics, all tenant-scoped where applicable.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::{
    models::{
        Account, AccountFilter, AccountStatus, ForwardedMessage, ForwardingDestination, Group,
        HealthStatus, MessageLog, WatchlistEntry,
    },
    persistence::error::PersistenceError,
};

/// Storage interface consumed by the monitoring core.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    // Account operations:

    /// Retrieves an account by id.
    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, PersistenceError>;

    /// Retrieves every account.
    async fn list_accounts(&self) -> Result<Vec<Account>, PersistenceError>;

    /// Inserts or replaces an account record.
    async fn upsert_account(&self, account: Account) -> Result<(), PersistenceError>;

    /// Sets the lifecycle status and last-error message of an account.
    async fn set_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
        error: Option<String>,
    ) -> Result<(), PersistenceError>;

    /// Persists the condensed health snapshot onto an account record.
    async fn set_account_health(
        &self,
        account_id: &str,
        health: HealthStatus,
        response_time_ms: Option<u64>,
        accessible_groups: Option<u64>,
    ) -> Result<(), PersistenceError>;

    /// Updates the last-activity timestamp of an account.
    async fn touch_account_activity(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError>;

    // Group operations:

    /// Finds the active group for `(tenant, chat_id)`, if any.
    async fn find_active_group(
        &self,
        tenant_id: &str,
        chat_id: i64,
    ) -> Result<Option<Group>, PersistenceError>;

    /// Inserts a group row.
    async fn insert_group(&self, group: Group) -> Result<(), PersistenceError>;

    /// Counts the active groups of a tenant.
    async fn count_active_groups(&self, tenant_id: &str) -> Result<u64, PersistenceError>;

    // Watchlist operations:

    /// Retrieves a watchlist entry by id.
    async fn get_watch_entry(
        &self,
        entry_id: &str,
    ) -> Result<Option<WatchlistEntry>, PersistenceError>;

    /// Retrieves a tenant's watchlist entries in insertion order.
    async fn list_watch_entries(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<WatchlistEntry>, PersistenceError>;

    /// Inserts a watchlist entry.
    async fn insert_watch_entry(&self, entry: WatchlistEntry) -> Result<(), PersistenceError>;

    // Advanced filter operations:

    /// Retrieves the advanced filters attached to an account.
    async fn list_account_filters(
        &self,
        account_id: &str,
    ) -> Result<Vec<AccountFilter>, PersistenceError>;

    /// Replaces the advanced filters attached to an account.
    async fn set_account_filters(
        &self,
        account_id: &str,
        filters: Vec<AccountFilter>,
    ) -> Result<(), PersistenceError>;

    // Destination operations:

    /// Retrieves a destination by id.
    async fn get_destination(
        &self,
        destination_id: &str,
    ) -> Result<Option<ForwardingDestination>, PersistenceError>;

    /// Retrieves a tenant's active destinations in insertion order.
    async fn list_active_destinations(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ForwardingDestination>, PersistenceError>;

    /// Inserts a destination.
    async fn insert_destination(
        &self,
        destination: ForwardingDestination,
    ) -> Result<(), PersistenceError>;

    /// Increments a destination's forwarded-message count and stamps the
    /// last-forwarded time.
    async fn record_destination_forward(
        &self,
        destination_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError>;

    // Audit log operations:

    /// Appends a message log row.
    async fn insert_message_log(&self, log: MessageLog) -> Result<(), PersistenceError>;

    /// Updates the forwarded flag and count of a message log. The flag is set
    /// when `forwarded_count` is non-zero.
    async fn mark_log_forwarded(
        &self,
        log_id: &str,
        forwarded_count: u32,
    ) -> Result<(), PersistenceError>;

    /// Retrieves the most recent message logs of a tenant, newest first.
    async fn list_message_logs(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageLog>, PersistenceError>;

    /// Counts the message logs of a tenant.
    async fn count_message_logs(&self, tenant_id: &str) -> Result<u64, PersistenceError>;

    /// Appends a forwarded-message audit row.
    async fn insert_forwarded_message(
        &self,
        record: ForwardedMessage,
    ) -> Result<(), PersistenceError>;

    /// Retrieves the forwarded-message audit rows of a tenant, newest first.
    async fn list_forwarded_messages(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ForwardedMessage>, PersistenceError>;

    /// Grouped count of successful forwards per destination name.
    async fn forwarded_counts_by_destination(
        &self,
        tenant_id: &str,
    ) -> Result<HashMap<String, u64>, PersistenceError>;
}
