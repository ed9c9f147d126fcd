//! Group discovery: enumerate the chats an account can see and register the
//! monitorable ones as tenant groups.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    account::registry::AccountRegistry,
    models::Group,
    persistence::{error::PersistenceError, traits::SessionStore},
    providers::traits::SessionError,
};

/// Errors raised during a discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The account has no live connection.
    #[error("account {0} is not registered")]
    NotRegistered(String),

    /// The session failed while enumerating dialogs.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] PersistenceError),
}

/// Counters for one discovery run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryReport {
    /// Monitorable chats seen in the enumeration.
    pub groups_seen: usize,

    /// Groups newly registered this run.
    pub groups_created: usize,
}

/// Registers the groups reachable by account connections.
pub struct GroupDiscovery {
    store: Arc<dyn SessionStore>,
    registry: Arc<AccountRegistry>,
}

impl GroupDiscovery {
    /// Creates a discovery service.
    pub fn new(store: Arc<dyn SessionStore>, registry: Arc<AccountRegistry>) -> Self {
        Self { store, registry }
    }

    /// Enumerates every chat visible to the account and creates a group row
    /// for each monitorable chat the tenant does not already monitor.
    /// Idempotent: an unchanged dialog list creates nothing on a second run.
    /// Groups that disappeared from the listing are left alone.
    pub async fn discover(&self, account_id: &str) -> Result<DiscoveryReport, DiscoveryError> {
        let connection = self
            .registry
            .get(account_id)
            .ok_or_else(|| DiscoveryError::NotRegistered(account_id.to_string()))?;

        let dialogs = connection.client.list_dialogs(None).await?;
        let mut report = DiscoveryReport::default();

        for chat in dialogs {
            if !chat.kind.is_monitorable() {
                continue;
            }
            report.groups_seen += 1;

            if self
                .store
                .find_active_group(&connection.tenant_id, chat.chat_id)
                .await?
                .is_some()
            {
                continue;
            }
            let group =
                Group::discovered(&connection.tenant_id, chat.chat_id, &chat.name, chat.kind);
            tracing::info!(
                account_id,
                tenant_id = %connection.tenant_id,
                chat_id = chat.chat_id,
                name = %chat.name,
                "registering discovered group"
            );
            self.store.insert_group(group).await?;
            report.groups_created += 1;
        }

        Ok(report)
    }
}
