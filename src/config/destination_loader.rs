use std::{fs, path::PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account_loader::is_yaml_file;
use crate::models::ForwardingDestination;

/// Container for destination configurations loaded from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfigFile {
    /// The seeded destinations.
    pub destinations: Vec<ForwardingDestination>,
}

/// Errors that can occur while loading destination configurations.
#[derive(Debug, Error)]
pub enum DestinationLoaderError {
    /// Error when reading the destination configuration file.
    #[error("Failed to load destination configuration: {0}")]
    IoError(std::io::Error),

    /// Error when parsing the destination configuration file.
    #[error("Failed to parse destination configuration: {0}")]
    ParseError(String),

    /// Error when the destination configuration format is unsupported.
    #[error("Unsupported destination configuration format")]
    UnsupportedFormat,
}

/// Loads destination configurations from a file.
pub struct DestinationLoader {
    path: PathBuf,
}

impl DestinationLoader {
    /// Creates a new `DestinationLoader` instance.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the destination configuration from the specified file.
    pub fn load(&self) -> Result<Vec<ForwardingDestination>, DestinationLoaderError> {
        if !is_yaml_file(&self.path) {
            return Err(DestinationLoaderError::UnsupportedFormat);
        }

        let config_str = fs::read_to_string(&self.path).map_err(DestinationLoaderError::IoError)?;
        let config: DestinationConfigFile = Config::builder()
            .add_source(File::from_str(&config_str, config::FileFormat::Yaml))
            .build()
            .map_err(|e| DestinationLoaderError::ParseError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DestinationLoaderError::ParseError(e.to_string()))?;

        Ok(config.destinations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_destinations() {
        let content = r#"
destinations:
  - id: "dest-alerts"
    tenant_id: "tenant-a"
    chat_id: -1001234
    name: "Alerts channel"
    kind: channel
  - id: "dest-ops"
    tenant_id: "tenant-a"
    chat_id: -1005678
    name: "Ops copies"
    kind: supergroup
    source_group_ids: ["group-ops"]
    allowed_usernames: ["alice"]
"#;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("destinations.yaml");
        fs::write(&path, content.trim()).unwrap();

        let destinations = DestinationLoader::new(path).load().unwrap();
        assert_eq!(destinations.len(), 2);
        assert!(destinations[0].active);
        assert_eq!(destinations[0].message_count, 0);
        assert_eq!(destinations[1].source_group_ids, vec!["group-ops".to_string()]);
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("destinations.toml");
        fs::write(&path, "destinations = []").unwrap();
        let result = DestinationLoader::new(path).load();
        assert!(matches!(result, Err(DestinationLoaderError::UnsupportedFormat)));
    }
}
