//! Builder that wires the supervisor's services together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{Supervisor, SupervisorError};
use crate::{
    account::{manager::AccountManager, registry::AccountRegistry},
    config::AppConfig,
    engine::{
        balancer::LoadBalancer,
        discovery::GroupDiscovery,
        filtering::{FilterEngine, WatchlistFilterEngine},
        forwarding::ForwardingPipeline,
        health::HealthMonitor,
        ingestor::MessageIngestor,
    },
    persistence::traits::SessionStore,
    providers::traits::SessionProvider,
};

/// Assembles a [`Supervisor`] from its external dependencies, constructing
/// and wiring the internal services.
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    store: Option<Arc<dyn SessionStore>>,
    provider: Option<Arc<dyn SessionProvider>>,
}

impl SupervisorBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self { config: None, store: None, provider: None }
    }

    /// Sets the application configuration.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the session store.
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the network session provider.
    pub fn provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Wires the services and builds the supervisor.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let store = self.store.ok_or(SupervisorError::MissingStore)?;
        let provider = self.provider.ok_or(SupervisorError::MissingProvider)?;

        let cancellation_token = CancellationToken::new();

        let registry = Arc::new(AccountRegistry::new());
        let balancer = Arc::new(LoadBalancer::new(Arc::clone(&registry)));
        let filter: Arc<dyn FilterEngine> =
            Arc::new(WatchlistFilterEngine::new(Arc::clone(&store)));
        let pipeline = Arc::new(ForwardingPipeline::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&balancer),
            config.send_timeout,
        ));
        let ingestor = Arc::new(MessageIngestor::new(
            Arc::clone(&store),
            filter,
            pipeline,
            Arc::clone(&balancer),
        ));
        let discovery = Arc::new(GroupDiscovery::new(Arc::clone(&store), Arc::clone(&registry)));
        let manager = Arc::new(AccountManager::new(
            Arc::clone(&store),
            provider,
            Arc::clone(&registry),
            discovery,
            ingestor,
            config.sessions_dir.clone(),
            cancellation_token.child_token(),
        ));
        let health = Arc::new(HealthMonitor::new(
            &config,
            Arc::clone(&registry),
            Arc::clone(&manager),
            Arc::clone(&store),
        ));

        Ok(Supervisor {
            config: Arc::new(config),
            manager,
            health,
            balancer,
            cancellation_token,
            join_set: tokio::task::JoinSet::new(),
        })
    }
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{persistence::memory::InMemorySessionStore, providers::traits::MockSessionProvider};

    #[test]
    fn build_requires_all_dependencies() {
        let result = SupervisorBuilder::new().build();
        assert!(matches!(result, Err(SupervisorError::MissingConfig)));

        let result = SupervisorBuilder::new().config(AppConfig::default()).build();
        assert!(matches!(result, Err(SupervisorError::MissingStore)));

        let result = SupervisorBuilder::new()
            .config(AppConfig::default())
            .store(Arc::new(InMemorySessionStore::new()))
            .build();
        assert!(matches!(result, Err(SupervisorError::MissingProvider)));

        let result = SupervisorBuilder::new()
            .config(AppConfig::default())
            .store(Arc::new(InMemorySessionStore::new()))
            .provider(Arc::new(MockSessionProvider::new()))
            .build();
        assert!(result.is_ok());
    }
}
