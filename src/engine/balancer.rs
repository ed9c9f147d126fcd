//! Load balancing across account connections. Recent message volume and
//! running average processing time both feed the score; counters reset on a
//! fixed schedule so recent load drives selection.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::{account::registry::AccountRegistry, models::LoadSummary};

/// Average processing time assumed for accounts with no history yet.
const DEFAULT_AVG_TIME_SECS: f64 = 1.0;

#[derive(Debug, Default, Clone)]
struct LoadStats {
    /// Messages processed since the last counter reset.
    load: u64,
    /// Lifetime processed count, feeds the running average.
    total_count: u64,
    /// Lifetime processing time in seconds.
    total_time_secs: f64,
}

impl LoadStats {
    fn avg_time(&self) -> f64 {
        if self.total_count == 0 {
            DEFAULT_AVG_TIME_SECS
        } else {
            self.total_time_secs / self.total_count as f64
        }
    }

    fn score(&self) -> f64 {
        self.load as f64 * self.avg_time()
    }
}

/// Tracks per-account load and picks the best account for outbound sends.
pub struct LoadBalancer {
    registry: Arc<AccountRegistry>,
    stats: DashMap<String, LoadStats>,
}

impl LoadBalancer {
    /// Creates a balancer over the given registry.
    pub fn new(registry: Arc<AccountRegistry>) -> Self {
        Self { registry, stats: DashMap::new() }
    }

    /// Records one processed message and its elapsed time for an account.
    pub fn record_processed(&self, account_id: &str, elapsed: Duration) {
        let mut stats = self.stats.entry(account_id.to_string()).or_default();
        stats.load += 1;
        stats.total_count += 1;
        stats.total_time_secs += elapsed.as_secs_f64();
    }

    /// Picks the candidate with the lowest `load × avg_time` score. Only
    /// candidates with a live registry entry are eligible; ties go to the
    /// earliest candidate.
    pub fn select_best(&self, candidates: &[String]) -> Option<String> {
        let mut best: Option<(&String, f64)> = None;
        for candidate in candidates {
            if !self.registry.contains(candidate) {
                continue;
            }
            let score = self.stats.get(candidate).map(|s| s.score()).unwrap_or(0.0);
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((candidate, score));
            }
        }
        best.map(|(id, _)| id.clone())
    }

    /// Clears the recent-load counters. History feeding the running average
    /// is kept.
    pub fn reset_counters(&self) {
        for mut entry in self.stats.iter_mut() {
            entry.load = 0;
        }
        tracing::debug!("load counters reset");
    }

    /// Aggregates the current counters.
    pub fn summary(&self) -> LoadSummary {
        let mut summary = LoadSummary {
            account_loads: Default::default(),
            account_performance: Default::default(),
            total_messages_processed: 0,
        };
        for entry in self.stats.iter() {
            summary.account_loads.insert(entry.key().clone(), entry.load);
            summary.account_performance.insert(entry.key().clone(), entry.avg_time());
            summary.total_messages_processed += entry.total_count;
        }
        summary
    }

    /// Periodic counter-reset loop, cancelled at shutdown.
    pub async fn run_reset_loop(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("load balancer reset loop shutting down");
                    break;
                }

                _ = tokio::time::sleep(interval) => {
                    let summary = self.summary();
                    tracing::debug!(
                        total_processed = summary.total_messages_processed,
                        accounts = summary.account_loads.len(),
                        "hourly load snapshot"
                    );
                    self.reset_counters();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account::registry::AccountConnection, providers::traits::MockSessionClient};

    fn register(registry: &AccountRegistry, account_id: &str) {
        registry.add(Arc::new(AccountConnection {
            account_id: account_id.to_string(),
            tenant_id: "tenant-a".to_string(),
            client: Arc::new(MockSessionClient::new()),
            cancel: CancellationToken::new(),
        }));
    }

    #[test]
    fn never_selects_an_unregistered_account() {
        let registry = Arc::new(AccountRegistry::new());
        register(&registry, "acct-1");
        let balancer = LoadBalancer::new(Arc::clone(&registry));

        let candidates = vec!["ghost".to_string(), "acct-1".to_string()];
        assert_eq!(balancer.select_best(&candidates), Some("acct-1".to_string()));
        assert_eq!(balancer.select_best(&["ghost".to_string()]), None);
    }

    #[test]
    fn lower_score_wins_and_ties_go_first() {
        let registry = Arc::new(AccountRegistry::new());
        register(&registry, "acct-1");
        register(&registry, "acct-2");
        let balancer = LoadBalancer::new(Arc::clone(&registry));

        let candidates = vec!["acct-1".to_string(), "acct-2".to_string()];
        // No history on either: tie, first candidate wins.
        assert_eq!(balancer.select_best(&candidates), Some("acct-1".to_string()));

        // Loading acct-1 shifts selection to acct-2.
        balancer.record_processed("acct-1", Duration::from_secs(2));
        assert_eq!(balancer.select_best(&candidates), Some("acct-2".to_string()));
    }

    #[test]
    fn avg_time_is_order_independent() {
        let registry = Arc::new(AccountRegistry::new());
        let balancer = LoadBalancer::new(registry);

        let times = [3.0, 1.0, 2.0, 6.0];
        for secs in times {
            balancer.record_processed("acct-1", Duration::from_secs_f64(secs));
        }
        let mut reversed = times;
        reversed.reverse();
        for secs in reversed {
            balancer.record_processed("acct-2", Duration::from_secs_f64(secs));
        }

        let summary = balancer.summary();
        let expected = times.iter().sum::<f64>() / times.len() as f64;
        assert!((summary.account_performance["acct-1"] - expected).abs() < 1e-9);
        assert!((summary.account_performance["acct-2"] - expected).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_load_but_keeps_history() {
        let registry = Arc::new(AccountRegistry::new());
        register(&registry, "acct-1");
        let balancer = LoadBalancer::new(Arc::clone(&registry));

        balancer.record_processed("acct-1", Duration::from_secs(4));
        balancer.reset_counters();

        let summary = balancer.summary();
        assert_eq!(summary.account_loads["acct-1"], 0);
        assert_eq!(summary.total_messages_processed, 1);
        assert!((summary.account_performance["acct-1"] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_candidate_list_selects_nothing() {
        let registry = Arc::new(AccountRegistry::new());
        let balancer = LoadBalancer::new(registry);
        assert_eq!(balancer.select_best(&[]), None);
    }
}
