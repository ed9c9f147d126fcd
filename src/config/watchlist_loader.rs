use std::{fs, path::PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account_loader::is_yaml_file;
use crate::models::WatchlistEntry;

/// Container for watchlist configurations loaded from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfigFile {
    /// The seeded entries.
    pub entries: Vec<WatchlistEntry>,
}

/// Errors that can occur while loading watchlist configurations.
#[derive(Debug, Error)]
pub enum WatchlistLoaderError {
    /// Error when reading the watchlist configuration file.
    #[error("Failed to load watchlist configuration: {0}")]
    IoError(std::io::Error),

    /// Error when parsing the watchlist configuration file.
    #[error("Failed to parse watchlist configuration: {0}")]
    ParseError(String),

    /// Error when the watchlist configuration format is unsupported.
    #[error("Unsupported watchlist configuration format")]
    UnsupportedFormat,

    /// An entry watches neither a username nor a user id.
    #[error("Watchlist entry '{0}' must set username or user_id")]
    NoTarget(String),
}

/// Loads watchlist configurations from a file.
pub struct WatchlistLoader {
    path: PathBuf,
}

impl WatchlistLoader {
    /// Creates a new `WatchlistLoader` instance.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the watchlist configuration from the specified file.
    pub fn load(&self) -> Result<Vec<WatchlistEntry>, WatchlistLoaderError> {
        if !is_yaml_file(&self.path) {
            return Err(WatchlistLoaderError::UnsupportedFormat);
        }

        let config_str = fs::read_to_string(&self.path).map_err(WatchlistLoaderError::IoError)?;
        let config: WatchlistConfigFile = Config::builder()
            .add_source(File::from_str(&config_str, config::FileFormat::Yaml))
            .build()
            .map_err(|e| WatchlistLoaderError::ParseError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| WatchlistLoaderError::ParseError(e.to_string()))?;

        for entry in &config.entries {
            if entry.username.is_none() && entry.user_id.is_none() {
                return Err(WatchlistLoaderError::NoTarget(entry.id.clone()));
            }
        }

        Ok(config.entries)
    }
}
