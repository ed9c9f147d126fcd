//! Initialization service: syncs the seed configuration files (accounts,
//! watchlist, destinations) into the session store at startup.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{
        AccountLoader, AccountLoaderError, AppConfig, DestinationLoader, DestinationLoaderError,
        WatchlistLoader, WatchlistLoaderError,
    },
    persistence::{error::PersistenceError, traits::SessionStore},
};

/// Errors raised during initialization.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// The account seed file failed to load.
    #[error(transparent)]
    Accounts(#[from] AccountLoaderError),

    /// The watchlist seed file failed to load.
    #[error(transparent)]
    Watchlist(#[from] WatchlistLoaderError),

    /// The destination seed file failed to load.
    #[error(transparent)]
    Destinations(#[from] DestinationLoaderError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] PersistenceError),
}

/// Counters for one initialization run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitializationSummary {
    /// Accounts newly inserted.
    pub accounts_seeded: usize,

    /// Watchlist entries newly inserted.
    pub watch_entries_seeded: usize,

    /// Destinations newly inserted.
    pub destinations_seeded: usize,
}

/// Loads seed files into the store. Idempotent: existing records are left
/// untouched, except that account filters are re-synced from file so filter
/// edits take effect on restart.
pub struct InitializationService {
    config: AppConfig,
    store: Arc<dyn SessionStore>,
}

impl InitializationService {
    /// Creates the service.
    pub fn new(config: AppConfig, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    /// Runs one initialization pass.
    pub async fn run(&self) -> Result<InitializationSummary, InitializationError> {
        let mut summary = InitializationSummary::default();

        let accounts = AccountLoader::new(self.config.accounts_config_path.clone()).load()?;
        for entry in accounts {
            if self.store.get_account(&entry.id).await?.is_none() {
                self.store.upsert_account(entry.to_account()).await?;
                summary.accounts_seeded += 1;
            }
            self.store.set_account_filters(&entry.id, entry.filters).await?;
        }

        let entries = WatchlistLoader::new(self.config.watchlist_config_path.clone()).load()?;
        for entry in entries {
            if self.store.get_watch_entry(&entry.id).await?.is_none() {
                self.store.insert_watch_entry(entry).await?;
                summary.watch_entries_seeded += 1;
            }
        }

        let destinations =
            DestinationLoader::new(self.config.destinations_config_path.clone()).load()?;
        for destination in destinations {
            if self.store.get_destination(&destination.id).await?.is_none() {
                self.store.insert_destination(destination).await?;
                summary.destinations_seeded += 1;
            }
        }

        tracing::info!(
            accounts = summary.accounts_seeded,
            watch_entries = summary.watch_entries_seeded,
            destinations = summary.destinations_seeded,
            "seed configuration synced into store"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::persistence::memory::InMemorySessionStore;

    fn seed_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("accounts.yaml"),
            r#"
accounts:
  - id: "acct-1"
    tenant_id: "tenant-a"
    display_name: "Main"
    credentials_ref: "main"
"#
            .trim(),
        )
        .unwrap();
        fs::write(
            dir.path().join("watchlist.yaml"),
            r#"
entries:
  - id: "watch-1"
    tenant_id: "tenant-a"
    username: "alice"
"#
            .trim(),
        )
        .unwrap();
        fs::write(
            dir.path().join("destinations.yaml"),
            r#"
destinations:
  - id: "dest-1"
    tenant_id: "tenant-a"
    chat_id: -100
    name: "Alerts"
    kind: channel
"#
            .trim(),
        )
        .unwrap();
        dir
    }

    fn config_for(dir: &TempDir) -> AppConfig {
        AppConfig::builder()
            .accounts_config_path(&dir.path().join("accounts.yaml"))
            .watchlist_config_path(&dir.path().join("watchlist.yaml"))
            .destinations_config_path(&dir.path().join("destinations.yaml"))
            .build()
    }

    #[tokio::test]
    async fn seeds_once_and_stays_idempotent() {
        let dir = seed_dir();
        let store = Arc::new(InMemorySessionStore::new());
        let service = InitializationService::new(config_for(&dir), store.clone());

        let first = service.run().await.unwrap();
        assert_eq!(first.accounts_seeded, 1);
        assert_eq!(first.watch_entries_seeded, 1);
        assert_eq!(first.destinations_seeded, 1);

        let second = service.run().await.unwrap();
        assert_eq!(second.accounts_seeded, 0);
        assert_eq!(second.watch_entries_seeded, 0);
        assert_eq!(second.destinations_seeded, 0);

        assert!(store.get_account("acct-1").await.unwrap().is_some());
        assert!(store.get_watch_entry("watch-1").await.unwrap().is_some());
        assert!(store.get_destination("dest-1").await.unwrap().is_some());
    }
}
