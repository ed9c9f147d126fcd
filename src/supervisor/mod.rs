//! The Supervisor owns every long-running service of the daemon: the
//! per-account event loops (through the account manager), the health monitor,
//! the load-balancer reset loop and the signal handler. It starts them,
//! watches them, and orchestrates a graceful shutdown.

mod builder;

use std::sync::Arc;

use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::signal;

use crate::{
    account::manager::AccountManager,
    config::AppConfig,
    engine::{balancer::LoadBalancer, health::HealthMonitor},
    initialization::InitializationError,
};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A session store was not provided to the `SupervisorBuilder`.
    #[error("Missing session store for Supervisor")]
    MissingStore,

    /// A session provider was not provided to the `SupervisorBuilder`.
    #[error("Missing session provider for Supervisor")]
    MissingProvider,

    /// Initialization of seed state failed.
    #[error(transparent)]
    Initialization(#[from] InitializationError),
}

/// The primary runtime manager for the application.
pub struct Supervisor {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// Lifecycle manager for account connections.
    manager: Arc<AccountManager>,

    /// The health monitor service.
    health: Arc<HealthMonitor>,

    /// The load balancer, for the counter-reset loop.
    balancer: Arc<LoadBalancer>,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: tokio_util::sync::CancellationToken,

    /// A set of all spawned tasks that the supervisor is actively managing.
    join_set: tokio::task::JoinSet<()>,
}

impl Supervisor {
    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Starts the supervisor and all its managed services, then blocks until
    /// shutdown. Steps:
    /// 1. Spawns a signal handler for `SIGINT` / `SIGTERM`.
    /// 2. Activates every stored account (failures are captured per account).
    /// 3. Spawns the health monitor and the load-reset loop.
    /// 4. Watches task health; a failed task triggers shutdown of the rest.
    /// 5. On shutdown, disconnects every account within the configured
    ///    timeout.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let cancellation_token = self.cancellation_token.clone();

        // Spawn a task to listen for shutdown signals.
        self.join_set.spawn(async move {
            let ctrl_c = signal::ctrl_c();
            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM handler")
                    .recv()
                    .await;
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
                _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
            }

            cancellation_token.cancel();
        });

        // Bring up the stored accounts. Event loops are owned by the manager
        // and cancelled through its child tokens.
        let activated = self.manager.activate_all().await;
        tracing::info!(activated, "account activation complete");

        // Spawn the health monitor service.
        let health = Arc::clone(&self.health);
        let health_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            health.run(health_token).await;
        });

        // Spawn the load-balancer counter reset loop.
        let balancer = Arc::clone(&self.balancer);
        let reset_interval = self.config.load_reset_interval;
        let reset_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            balancer.run_reset_loop(reset_interval, reset_token).await;
        });

        // Main loop: watch task health and the shutdown signal.
        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(_)) => {
                            // Task completed, keep watching the rest.
                        }
                        Some(Err(e)) => {
                            tracing::error!("A critical task failed: {:?}. Initiating shutdown.", e);
                            self.cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = self.cancellation_token.cancelled() => {
                    break;
                }
            }
        }

        // Graceful shutdown: stop the remaining tasks, then close every
        // account session within the timeout.
        self.cancellation_token.cancel();
        self.join_set.shutdown().await;
        tracing::info!("All supervised tasks have completed.");

        let cleanup = self.manager.shutdown();
        if tokio::time::timeout(self.config.shutdown_timeout, cleanup).await.is_err() {
            tracing::warn!(
                "Account cleanup did not complete within {:?}. Continuing shutdown.",
                self.config.shutdown_timeout
            );
        } else {
            tracing::info!("All account sessions closed.");
        }

        tracing::info!("Supervisor shutdown complete.");
        Ok(())
    }
}
