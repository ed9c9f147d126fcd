//! Account connection lifecycle: activate (connect, authorize, register,
//! discover, monitor) and deactivate (unsubscribe, disconnect, deregister).

use std::{path::PathBuf, sync::Arc, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::registry::{AccountConnection, AccountRegistry};
use crate::{
    engine::{discovery::GroupDiscovery, ingestor::MessageIngestor},
    models::{Account, AccountStatus},
    persistence::{error::PersistenceError, traits::SessionStore},
    providers::traits::{AccountCredentials, SessionError, SessionProvider},
};

/// Errors raised by the account lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No account with the given id exists in the store.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The account already has a live connection.
    #[error("account {0} is already active")]
    AlreadyActive(String),

    /// The credential pair could not be loaded.
    #[error("failed to load credentials: {0}")]
    Credentials(String),

    /// The session connected but is not authorized.
    #[error("session not authorized")]
    NotAuthorized,

    /// The network session failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] PersistenceError),
}

/// Owns activation and deactivation of account connections. All status
/// transitions on `Account` records route through here.
pub struct AccountManager {
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn SessionProvider>,
    registry: Arc<AccountRegistry>,
    discovery: Arc<GroupDiscovery>,
    ingestor: Arc<MessageIngestor>,
    sessions_dir: PathBuf,
    shutdown: CancellationToken,
}

impl AccountManager {
    /// Creates a manager. `shutdown` is the parent token for every
    /// per-connection event loop.
    pub fn new(
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn SessionProvider>,
        registry: Arc<AccountRegistry>,
        discovery: Arc<GroupDiscovery>,
        ingestor: Arc<MessageIngestor>,
        sessions_dir: PathBuf,
        shutdown: CancellationToken,
    ) -> Self {
        Self { store, provider, registry, discovery, ingestor, sessions_dir, shutdown }
    }

    /// Activates an account: loads credentials, opens the session, verifies
    /// authorization, registers the connection, runs group discovery and
    /// starts the event loop. On any failure the account ends up with
    /// `status = error` and no registry entry.
    pub async fn activate(&self, account_id: &str) -> Result<(), LifecycleError> {
        if self.registry.contains(account_id) {
            return Err(LifecycleError::AlreadyActive(account_id.to_string()));
        }
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| LifecycleError::AccountNotFound(account_id.to_string()))?;

        match self.connect_and_register(&account).await {
            Ok(()) => {
                tracing::info!(account_id, tenant_id = %account.tenant_id, "account activated");
                Ok(())
            }
            Err(error) => {
                if let Err(store_error) = self
                    .store
                    .set_account_status(account_id, AccountStatus::Error, Some(error.to_string()))
                    .await
                {
                    tracing::error!(account_id, error = %store_error, "failed to record activation error");
                }
                tracing::warn!(account_id, %error, "account activation failed");
                Err(error)
            }
        }
    }

    async fn connect_and_register(&self, account: &Account) -> Result<(), LifecycleError> {
        let credentials = self.load_credentials(&account.credentials_ref)?;
        let client = self.provider.open(&credentials).await?;

        match client.is_authorized().await {
            Ok(true) => {}
            Ok(false) => {
                client.disconnect().await;
                return Err(LifecycleError::NotAuthorized);
            }
            Err(error) => {
                client.disconnect().await;
                return Err(error.into());
            }
        }

        let connection = Arc::new(AccountConnection {
            account_id: account.id.clone(),
            tenant_id: account.tenant_id.clone(),
            client,
            cancel: self.shutdown.child_token(),
        });
        self.registry.add(Arc::clone(&connection));

        if let Err(error) =
            self.store.set_account_status(&account.id, AccountStatus::Active, None).await
        {
            // Roll back so the registry never holds a connection for an
            // account that is not marked active.
            self.registry.remove(&account.id);
            connection.cancel.cancel();
            connection.client.disconnect().await;
            return Err(error.into());
        }

        match self.discovery.discover(&account.id).await {
            Ok(report) => tracing::info!(
                account_id = %account.id,
                groups_seen = report.groups_seen,
                groups_created = report.groups_created,
                "group discovery complete"
            ),
            Err(error) => {
                tracing::warn!(account_id = %account.id, %error, "group discovery failed")
            }
        }

        let ingestor = Arc::clone(&self.ingestor);
        let pump = Arc::clone(&connection);
        tokio::spawn(async move { run_event_loop(pump, ingestor).await });

        Ok(())
    }

    /// Deactivates an account: cancels its event loop, closes the session,
    /// removes it from the registry and marks it inactive. Calling this for
    /// an id without a connection or store record is a no-op.
    pub async fn deactivate(&self, account_id: &str) -> Result<(), LifecycleError> {
        if let Some(connection) = self.registry.remove(account_id) {
            connection.cancel.cancel();
            connection.client.disconnect().await;
            tracing::info!(account_id, "account connection closed");
        }
        if self.store.get_account(account_id).await?.is_some() {
            self.store.set_account_status(account_id, AccountStatus::Inactive, None).await?;
        }
        Ok(())
    }

    /// Activates every stored account, capturing failures per account.
    /// Returns the number of accounts that came up.
    pub async fn activate_all(&self) -> usize {
        let accounts = match self.store.list_accounts().await {
            Ok(accounts) => accounts,
            Err(error) => {
                tracing::error!(%error, "failed to list accounts for activation");
                return 0;
            }
        };
        let mut activated = 0;
        for account in accounts {
            match self.activate(&account.id).await {
                Ok(()) => activated += 1,
                Err(error) => {
                    tracing::warn!(account_id = %account.id, %error, "skipping account")
                }
            }
        }
        activated
    }

    /// Deactivates every registered account.
    pub async fn shutdown(&self) {
        for account_id in self.registry.ids() {
            if let Err(error) = self.deactivate(&account_id).await {
                tracing::warn!(%account_id, %error, "failed to deactivate account on shutdown");
            }
        }
    }

    fn load_credentials(&self, credentials_ref: &str) -> Result<AccountCredentials, LifecycleError> {
        let session_file = self.sessions_dir.join(format!("{credentials_ref}.session"));
        let metadata_file = self.sessions_dir.join(format!("{credentials_ref}.json"));
        if !session_file.exists() {
            return Err(LifecycleError::Credentials(format!(
                "missing session file {}",
                session_file.display()
            )));
        }
        let raw = std::fs::read_to_string(&metadata_file).map_err(|e| {
            LifecycleError::Credentials(format!("{}: {e}", metadata_file.display()))
        })?;
        let profile = serde_json::from_str(&raw).map_err(|e| {
            LifecycleError::Credentials(format!("{}: {e}", metadata_file.display()))
        })?;
        Ok(AccountCredentials { session_file, profile })
    }
}

/// Receive loop for one connection. Runs until the connection is cancelled or
/// the event stream closes; per-event failures never terminate the loop.
async fn run_event_loop(connection: Arc<AccountConnection>, ingestor: Arc<MessageIngestor>) {
    tracing::debug!(account_id = %connection.account_id, "event loop started");
    loop {
        tokio::select! {
            biased;

            _ = connection.cancel.cancelled() => {
                tracing::debug!(account_id = %connection.account_id, "event loop cancelled");
                break;
            }

            event = connection.client.next_event() => match event {
                Ok(event) => ingestor.process(&connection, event).await,
                Err(SessionError::StreamClosed) => {
                    tracing::warn!(account_id = %connection.account_id, "event stream closed");
                    break;
                }
                Err(error) => {
                    // Expected while the connection is being torn down by
                    // recovery; the health monitor decides what happens next.
                    tracing::warn!(account_id = %connection.account_id, %error, "event stream error");
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }
    tracing::debug!(account_id = %connection.account_id, "event loop stopped");
}
