//! In-memory health and load records plus the aggregated summaries surfaced
//! to collaborators.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one health probe for one account. Overwritten on every tick.
#[derive(Debug, Clone, Serialize)]
pub struct AccountHealthRecord {
    /// Whether the session reported itself connected.
    pub connected: bool,

    /// Whether the session is authorized.
    pub authorized: bool,

    /// Response time of the identity probe, in milliseconds.
    pub response_time_ms: Option<u64>,

    /// Number of probe sub-steps that errored.
    pub error_count: u32,

    /// When the probe ran.
    pub checked_at: DateTime<Utc>,
}

impl AccountHealthRecord {
    /// Whether the account counts as healthy.
    pub fn is_healthy(&self) -> bool {
        self.connected && self.authorized
    }

    /// Record for a probe that did not finish within its timeout.
    pub fn timed_out() -> Self {
        Self {
            connected: false,
            authorized: false,
            response_time_ms: None,
            error_count: 1,
            checked_at: Utc::now(),
        }
    }
}

/// Aggregation over the current in-memory health records.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    /// Number of accounts with a health record.
    pub total_accounts: usize,

    /// Accounts classified healthy at the last probe.
    pub healthy_accounts: usize,

    /// Accounts classified unhealthy at the last probe.
    pub unhealthy_accounts: usize,

    /// `healthy / total`, in percent; zero when no records exist.
    pub health_percentage: f64,

    /// Mean identity-probe response time over accounts that reported one.
    pub avg_response_time_ms: f64,

    /// When the last full tick completed.
    pub last_check: Option<DateTime<Utc>>,
}

/// Aggregation over the load balancer's counters.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    /// Recent message count per account (reset on the balancer's schedule).
    pub account_loads: HashMap<String, u64>,

    /// Running average processing time per account, in seconds.
    pub account_performance: HashMap<String, f64>,

    /// Lifetime processed-message count across accounts.
    pub total_messages_processed: u64,
}
