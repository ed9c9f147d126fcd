//! Registry of live account connections.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::providers::traits::SessionClient;

/// A live network session bound to one account. Runtime-only; owned
/// exclusively by the registry.
pub struct AccountConnection {
    /// Account the session belongs to.
    pub account_id: String,

    /// Tenant owning the account.
    pub tenant_id: String,

    /// The underlying session.
    pub client: Arc<dyn SessionClient>,

    /// Cancels the connection's event loop.
    pub cancel: CancellationToken,
}

/// The set of live connections, keyed by account id. Map entry locking
/// serializes add/remove per id; reads are concurrent.
#[derive(Default)]
pub struct AccountRegistry {
    connections: DashMap<String, Arc<AccountConnection>>,
}

impl AccountRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, replacing any previous one for the same id.
    pub fn add(&self, connection: Arc<AccountConnection>) {
        self.connections.insert(connection.account_id.clone(), connection);
    }

    /// Looks up the connection for an account.
    pub fn get(&self, account_id: &str) -> Option<Arc<AccountConnection>> {
        self.connections.get(account_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes and returns the connection for an account.
    pub fn remove(&self, account_id: &str) -> Option<Arc<AccountConnection>> {
        self.connections.remove(account_id).map(|(_, connection)| connection)
    }

    /// Whether an account currently has a live connection.
    pub fn contains(&self, account_id: &str) -> bool {
        self.connections.contains_key(account_id)
    }

    /// Ids of all registered accounts. No ordering guarantee.
    pub fn ids(&self) -> Vec<String> {
        self.connections.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no accounts are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
