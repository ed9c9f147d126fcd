//! In-memory implementation of the session store. Collections whose
//! iteration order carries meaning (watchlist, destinations) are kept as
//! vectors in insertion order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    models::{
        Account, AccountFilter, AccountStatus, ForwardedMessage, ForwardingDestination, Group,
        HealthStatus, MessageLog, WatchlistEntry,
    },
    persistence::{error::PersistenceError, traits::SessionStore},
};

/// Reference implementation of [`SessionStore`] backed by process memory.
#[derive(Default)]
pub struct InMemorySessionStore {
    accounts: RwLock<HashMap<String, Account>>,
    groups: RwLock<Vec<Group>>,
    watch_entries: RwLock<Vec<WatchlistEntry>>,
    destinations: RwLock<Vec<ForwardingDestination>>,
    account_filters: RwLock<HashMap<String, Vec<AccountFilter>>>,
    message_logs: RwLock<Vec<MessageLog>>,
    forwarded_messages: RwLock<Vec<ForwardedMessage>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, PersistenceError> {
        Ok(self.accounts.read().await.get(account_id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PersistenceError> {
        let mut accounts: Vec<Account> = self.accounts.read().await.values().cloned().collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    async fn upsert_account(&self, account: Account) -> Result<(), PersistenceError> {
        self.accounts.write().await.insert(account.id.clone(), account);
        Ok(())
    }

    async fn set_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
        error: Option<String>,
    ) -> Result<(), PersistenceError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("account {account_id}")))?;
        account.status = status;
        account.last_error = error;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn set_account_health(
        &self,
        account_id: &str,
        health: HealthStatus,
        response_time_ms: Option<u64>,
        accessible_groups: Option<u64>,
    ) -> Result<(), PersistenceError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("account {account_id}")))?;
        account.health_status = health;
        if response_time_ms.is_some() {
            account.avg_response_time_ms = response_time_ms;
        }
        if accessible_groups.is_some() {
            account.accessible_groups = accessible_groups;
        }
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn touch_account_activity(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("account {account_id}")))?;
        account.last_activity = Some(at);
        Ok(())
    }

    async fn find_active_group(
        &self,
        tenant_id: &str,
        chat_id: i64,
    ) -> Result<Option<Group>, PersistenceError> {
        Ok(self
            .groups
            .read()
            .await
            .iter()
            .find(|g| g.active && g.tenant_id == tenant_id && g.chat_id == chat_id)
            .cloned())
    }

    async fn insert_group(&self, group: Group) -> Result<(), PersistenceError> {
        let mut groups = self.groups.write().await;
        if groups.iter().any(|g| g.id == group.id) {
            return Err(PersistenceError::AlreadyExists(format!("group {}", group.id)));
        }
        groups.push(group);
        Ok(())
    }

    async fn count_active_groups(&self, tenant_id: &str) -> Result<u64, PersistenceError> {
        Ok(self
            .groups
            .read()
            .await
            .iter()
            .filter(|g| g.active && g.tenant_id == tenant_id)
            .count() as u64)
    }

    async fn get_watch_entry(
        &self,
        entry_id: &str,
    ) -> Result<Option<WatchlistEntry>, PersistenceError> {
        Ok(self.watch_entries.read().await.iter().find(|e| e.id == entry_id).cloned())
    }

    async fn list_watch_entries(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<WatchlistEntry>, PersistenceError> {
        Ok(self
            .watch_entries
            .read()
            .await
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn insert_watch_entry(&self, entry: WatchlistEntry) -> Result<(), PersistenceError> {
        let mut entries = self.watch_entries.write().await;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(PersistenceError::AlreadyExists(format!("watchlist entry {}", entry.id)));
        }
        entries.push(entry);
        Ok(())
    }

    async fn list_account_filters(
        &self,
        account_id: &str,
    ) -> Result<Vec<AccountFilter>, PersistenceError> {
        Ok(self.account_filters.read().await.get(account_id).cloned().unwrap_or_default())
    }

    async fn set_account_filters(
        &self,
        account_id: &str,
        filters: Vec<AccountFilter>,
    ) -> Result<(), PersistenceError> {
        self.account_filters.write().await.insert(account_id.to_string(), filters);
        Ok(())
    }

    async fn get_destination(
        &self,
        destination_id: &str,
    ) -> Result<Option<ForwardingDestination>, PersistenceError> {
        Ok(self.destinations.read().await.iter().find(|d| d.id == destination_id).cloned())
    }

    async fn list_active_destinations(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ForwardingDestination>, PersistenceError> {
        Ok(self
            .destinations
            .read()
            .await
            .iter()
            .filter(|d| d.active && d.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn insert_destination(
        &self,
        destination: ForwardingDestination,
    ) -> Result<(), PersistenceError> {
        let mut destinations = self.destinations.write().await;
        if destinations.iter().any(|d| d.id == destination.id) {
            return Err(PersistenceError::AlreadyExists(format!(
                "destination {}",
                destination.id
            )));
        }
        destinations.push(destination);
        Ok(())
    }

    async fn record_destination_forward(
        &self,
        destination_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let mut destinations = self.destinations.write().await;
        let destination = destinations
            .iter_mut()
            .find(|d| d.id == destination_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("destination {destination_id}")))?;
        destination.message_count += 1;
        destination.last_forwarded = Some(at);
        Ok(())
    }

    async fn insert_message_log(&self, log: MessageLog) -> Result<(), PersistenceError> {
        self.message_logs.write().await.push(log);
        Ok(())
    }

    async fn mark_log_forwarded(
        &self,
        log_id: &str,
        forwarded_count: u32,
    ) -> Result<(), PersistenceError> {
        let mut logs = self.message_logs.write().await;
        let log = logs
            .iter_mut()
            .find(|l| l.id == log_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("message log {log_id}")))?;
        log.is_forwarded = forwarded_count > 0;
        log.forwarded_count = forwarded_count;
        Ok(())
    }

    async fn list_message_logs(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageLog>, PersistenceError> {
        Ok(self
            .message_logs
            .read()
            .await
            .iter()
            .rev()
            .filter(|l| l.tenant_id == tenant_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_message_logs(&self, tenant_id: &str) -> Result<u64, PersistenceError> {
        Ok(self.message_logs.read().await.iter().filter(|l| l.tenant_id == tenant_id).count()
            as u64)
    }

    async fn insert_forwarded_message(
        &self,
        record: ForwardedMessage,
    ) -> Result<(), PersistenceError> {
        self.forwarded_messages.write().await.push(record);
        Ok(())
    }

    async fn list_forwarded_messages(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<ForwardedMessage>, PersistenceError> {
        Ok(self
            .forwarded_messages
            .read()
            .await
            .iter()
            .rev()
            .filter(|f| f.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn forwarded_counts_by_destination(
        &self,
        tenant_id: &str,
    ) -> Result<HashMap<String, u64>, PersistenceError> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for record in self.forwarded_messages.read().await.iter() {
            if record.tenant_id != tenant_id {
                continue;
            }
            for name in &record.forwarded_to {
                *counts.entry(name.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
