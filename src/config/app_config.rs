use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::helpers::deserialize_duration_from_seconds;

/// Provides the default value for sessions_dir.
fn default_sessions_dir() -> PathBuf {
    PathBuf::from("sessions")
}

/// Provides the default value for health_check_interval.
fn default_health_check_interval() -> Duration {
    Duration::from_secs(300)
}

/// Provides the default value for health_probe_timeout.
fn default_health_probe_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Provides the default value for recovery_backoff.
fn default_recovery_backoff() -> Duration {
    Duration::from_secs(10)
}

/// Provides the default value for dialog_sample_limit.
fn default_dialog_sample_limit() -> usize {
    50
}

/// Provides the default value for load_reset_interval.
fn default_load_reset_interval() -> Duration {
    Duration::from_secs(3600)
}

/// Provides the default value for send_timeout.
fn default_send_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Provides the default value for shutdown_timeout.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Application configuration for Vigil.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Directory holding the `<credentials_ref>.session` / `.json` pairs.
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,

    /// Telegram application id used when opening sessions.
    pub api_id: i32,

    /// Telegram application hash used when opening sessions.
    pub api_hash: String,

    /// Interval between health-check ticks.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_health_check_interval"
    )]
    pub health_check_interval: Duration,

    /// Per-account bound on one health probe.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_health_probe_timeout"
    )]
    pub health_probe_timeout: Duration,

    /// Wait between tearing down and re-initializing an unhealthy account.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_recovery_backoff"
    )]
    pub recovery_backoff: Duration,

    /// Upper bound on the dialog sample used to count accessible groups.
    #[serde(default = "default_dialog_sample_limit")]
    pub dialog_sample_limit: usize,

    /// Interval between load-balancer counter resets.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_load_reset_interval"
    )]
    pub load_reset_interval: Duration,

    /// Bound on one forwarding send attempt.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_send_timeout"
    )]
    pub send_timeout: Duration,

    /// The maximum time to wait for graceful shutdown.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_shutdown_timeout"
    )]
    pub shutdown_timeout: Duration,

    /// Path to the account seed file.
    #[serde(skip_deserializing)]
    pub accounts_config_path: PathBuf,

    /// Path to the watchlist seed file.
    #[serde(skip_deserializing)]
    pub watchlist_config_path: PathBuf,

    /// Path to the destination seed file.
    #[serde(skip_deserializing)]
    pub destinations_config_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
            api_id: 0,
            api_hash: String::new(),
            health_check_interval: default_health_check_interval(),
            health_probe_timeout: default_health_probe_timeout(),
            recovery_backoff: default_recovery_backoff(),
            dialog_sample_limit: default_dialog_sample_limit(),
            load_reset_interval: default_load_reset_interval(),
            send_timeout: default_send_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            accounts_config_path: PathBuf::new(),
            watchlist_config_path: PathBuf::new(),
            destinations_config_path: PathBuf::new(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading from the configuration directory.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("VIGIL").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        // Seed-file paths are resolved relative to the config directory.
        let config_path = Path::new(config_dir_str);
        config.accounts_config_path = config_path.join("accounts.yaml");
        config.watchlist_config_path = config_path.join("watchlist.yaml");
        config.destinations_config_path = config_path.join("destinations.yaml");

        Ok(config)
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances in tests.
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Sets the sessions directory.
    pub fn sessions_dir(mut self, dir: &Path) -> Self {
        self.config.sessions_dir = dir.to_path_buf();
        self
    }

    /// Sets the health-check interval.
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// Sets the per-probe timeout.
    pub fn health_probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.health_probe_timeout = timeout;
        self
    }

    /// Sets the recovery backoff.
    pub fn recovery_backoff(mut self, backoff: Duration) -> Self {
        self.config.recovery_backoff = backoff;
        self
    }

    /// Sets the dialog sample limit.
    pub fn dialog_sample_limit(mut self, limit: usize) -> Self {
        self.config.dialog_sample_limit = limit;
        self
    }

    /// Sets the send timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// Sets the accounts seed path.
    pub fn accounts_config_path(mut self, path: &Path) -> Self {
        self.config.accounts_config_path = path.to_path_buf();
        self
    }

    /// Sets the watchlist seed path.
    pub fn watchlist_config_path(mut self, path: &Path) -> Self {
        self.config.watchlist_config_path = path.to_path_buf();
        self
    }

    /// Sets the destinations seed path.
    pub fn destinations_config_path(mut self, path: &Path) -> Self {
        self.config.destinations_config_path = path.to_path_buf();
        self
    }

    /// Builds the `AppConfig` instance.
    pub fn build(self) -> AppConfig {
        self.config
    }
}
