//! Periodic health probing of account connections, with automatic recovery
//! of accounts that lost their connection or authorization.

use std::{sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    account::{manager::AccountManager, registry::AccountRegistry},
    config::AppConfig,
    models::{AccountHealthRecord, HealthStatus, HealthSummary},
    persistence::traits::SessionStore,
};

/// Probes every registered account on a fixed schedule, records health and
/// triggers recovery on failure. Runs independently of message ingestion.
pub struct HealthMonitor {
    registry: Arc<AccountRegistry>,
    manager: Arc<AccountManager>,
    store: Arc<dyn SessionStore>,
    interval: Duration,
    probe_timeout: Duration,
    recovery_backoff: Duration,
    dialog_sample_limit: usize,
    records: DashMap<String, AccountHealthRecord>,
    last_check: ArcSwapOption<DateTime<Utc>>,
}

impl HealthMonitor {
    /// Creates a monitor with the intervals and limits from the app config.
    pub fn new(
        config: &AppConfig,
        registry: Arc<AccountRegistry>,
        manager: Arc<AccountManager>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            registry,
            manager,
            store,
            interval: config.health_check_interval,
            probe_timeout: config.health_probe_timeout,
            recovery_backoff: config.recovery_backoff,
            dialog_sample_limit: config.dialog_sample_limit,
            records: DashMap::new(),
            last_check: ArcSwapOption::empty(),
        }
    }

    /// The periodic loop. Cancelled at shutdown.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("health monitor shutting down");
                    break;
                }

                _ = tokio::time::sleep(self.interval) => {
                    self.tick().await;
                    let summary = self.summary();
                    tracing::info!(
                        total = summary.total_accounts,
                        healthy = summary.healthy_accounts,
                        health_percentage = summary.health_percentage,
                        avg_response_time_ms = summary.avg_response_time_ms,
                        "health check complete"
                    );
                }
            }
        }
    }

    /// Probes every registered account once. Each probe is bounded by the
    /// configured timeout so one stuck account cannot stall the tick; an
    /// unhealthy account gets exactly one recovery attempt.
    pub async fn tick(&self) {
        for account_id in self.registry.ids() {
            let outcome =
                match tokio::time::timeout(self.probe_timeout, self.probe(&account_id)).await {
                    Ok(Some(outcome)) => outcome,
                    Ok(None) => {
                        // The account disappeared mid-check.
                        tracing::debug!(account_id, "account deregistered during health check");
                        continue;
                    }
                    Err(_) => {
                        tracing::warn!(
                            account_id,
                            timeout = ?self.probe_timeout,
                            "health probe timed out"
                        );
                        (AccountHealthRecord::timed_out(), None)
                    }
                };
            let (record, accessible_groups) = outcome;
            let healthy = record.is_healthy();
            self.records.insert(account_id.clone(), record.clone());

            let status =
                if healthy { HealthStatus::Healthy } else { HealthStatus::Unhealthy };
            if let Err(error) = self
                .store
                .set_account_health(&account_id, status, record.response_time_ms, accessible_groups)
                .await
            {
                tracing::warn!(account_id, %error, "failed to persist health snapshot");
            }

            if !healthy {
                self.recover(&account_id).await;
            }
        }
        self.last_check.store(Some(Arc::new(Utc::now())));
    }

    /// Runs the probe steps against one account. Returns `None` when the
    /// account has no connection (skip), otherwise the health record and the
    /// sampled accessible-group count.
    async fn probe(&self, account_id: &str) -> Option<(AccountHealthRecord, Option<u64>)> {
        let connection = self.registry.get(account_id)?;
        let mut record = AccountHealthRecord {
            connected: connection.client.is_connected().await,
            authorized: false,
            response_time_ms: None,
            error_count: 0,
            checked_at: Utc::now(),
        };
        let mut accessible_groups = None;

        if record.connected {
            match connection.client.is_authorized().await {
                Ok(authorized) => record.authorized = authorized,
                Err(error) => {
                    tracing::debug!(account_id, %error, "authorization probe failed");
                    record.error_count += 1;
                }
            }
        }

        if record.authorized {
            let started = Instant::now();
            match connection.client.get_self().await {
                Ok(_) => record.response_time_ms = Some(started.elapsed().as_millis() as u64),
                Err(error) => {
                    tracing::debug!(account_id, %error, "identity probe failed");
                    record.error_count += 1;
                }
            }

            match connection.client.list_dialogs(Some(self.dialog_sample_limit)).await {
                Ok(dialogs) => {
                    accessible_groups =
                        Some(dialogs.iter().filter(|d| d.kind.is_monitorable()).count() as u64);
                }
                Err(error) => {
                    tracing::debug!(account_id, %error, "dialog sample failed");
                    record.error_count += 1;
                }
            }
        }

        Some((record, accessible_groups))
    }

    /// One recovery attempt: tear the connection down, wait the backoff,
    /// re-initialize. A failed recovery is logged and left for the next tick.
    async fn recover(&self, account_id: &str) {
        tracing::warn!(account_id, "account unhealthy, attempting recovery");
        if let Err(error) = self.manager.deactivate(account_id).await {
            tracing::warn!(account_id, %error, "failed to tear down unhealthy account");
        }
        tokio::time::sleep(self.recovery_backoff).await;
        match self.manager.activate(account_id).await {
            Ok(()) => tracing::info!(account_id, "account recovered"),
            Err(error) => {
                tracing::warn!(account_id, %error, "recovery failed, will retry next tick")
            }
        }
    }

    /// Aggregates the current in-memory records. No I/O.
    pub fn summary(&self) -> HealthSummary {
        let total = self.records.len();
        let healthy = self.records.iter().filter(|r| r.is_healthy()).count();
        let response_times: Vec<u64> =
            self.records.iter().filter_map(|r| r.response_time_ms).collect();
        let avg_response_time_ms = if response_times.is_empty() {
            0.0
        } else {
            response_times.iter().sum::<u64>() as f64 / response_times.len() as f64
        };
        HealthSummary {
            total_accounts: total,
            healthy_accounts: healthy,
            unhealthy_accounts: total - healthy,
            health_percentage: if total == 0 {
                0.0
            } else {
                healthy as f64 / total as f64 * 100.0
            },
            avg_response_time_ms,
            last_check: self.last_check.load_full().map(|at| *at),
        }
    }
}
