//! This module defines the `Account` record, one monitored Telegram identity
//! owned by a tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an account. Transitions happen only through the
/// account lifecycle operations, never by flipping the field directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Created but not connected.
    Inactive,
    /// Connected, authorized and monitoring.
    Active,
    /// The last connect attempt failed; `last_error` carries the message.
    Error,
}

/// Health classification refreshed by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Not probed yet.
    Unknown,
    /// Connected and authorized at the last probe.
    Healthy,
    /// Disconnected, unauthorized or unresponsive at the last probe.
    Unhealthy,
}

/// One monitored Telegram identity/session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, immutable once created.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Operator-facing label.
    pub display_name: String,

    /// Lifecycle status.
    pub status: AccountStatus,

    /// Last health classification.
    pub health_status: HealthStatus,

    /// When this account last forwarded a matched message.
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,

    /// Message of the last activation or health failure.
    #[serde(default)]
    pub last_error: Option<String>,

    /// Names the credential pair `<ref>.session` / `<ref>.json` under the
    /// configured sessions directory.
    pub credentials_ref: String,

    /// Response time of the last identity probe, in milliseconds.
    #[serde(default)]
    pub avg_response_time_ms: Option<u64>,

    /// Number of monitorable chats seen by the last health probe
    /// (bounded sample, not a full enumeration).
    #[serde(default)]
    pub accessible_groups: Option<u64>,

    /// Timestamp when the account was created.
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,

    /// Timestamp when the account was last updated.
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Provides a default timestamp for serde deserialization.
fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl Account {
    /// Creates a new inactive account.
    pub fn new(id: &str, tenant_id: &str, display_name: &str, credentials_ref: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            display_name: display_name.to_string(),
            status: AccountStatus::Inactive,
            health_status: HealthStatus::Unknown,
            last_activity: None,
            last_error: None,
            credentials_ref: credentials_ref.to_string(),
            avg_response_time_ms: None,
            accessible_groups: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Metadata document stored next to a session blob. Unknown fields are
/// ignored; only `phone_number` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Phone number the session belongs to.
    pub phone_number: String,

    /// Telegram username, without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,

    /// First name on the Telegram profile.
    #[serde(default)]
    pub first_name: Option<String>,

    /// Last name on the Telegram profile.
    #[serde(default)]
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_inactive_and_unknown() {
        let account = Account::new("acct-1", "tenant-a", "Main", "main");
        assert_eq!(account.status, AccountStatus::Inactive);
        assert_eq!(account.health_status, HealthStatus::Unknown);
        assert!(account.last_error.is_none());
        assert!(account.last_activity.is_none());
    }

    #[test]
    fn profile_tolerates_missing_optional_fields() {
        let profile: AccountProfile =
            serde_json::from_str(r#"{"phone_number": "+15550001", "extra": 1}"#).unwrap();
        assert_eq!(profile.phone_number, "+15550001");
        assert!(profile.username.is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AccountStatus::Active).unwrap(), "\"active\"");
        assert_eq!(serde_json::to_string(&HealthStatus::Unhealthy).unwrap(), "\"unhealthy\"");
    }
}
