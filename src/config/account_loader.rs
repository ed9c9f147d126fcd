use std::{fs, path::PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Account, AccountFilter};

/// One account in the seed file: identity plus the advanced filters attached
/// to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfigEntry {
    /// Account id.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Operator-facing label.
    pub display_name: String,

    /// Names the credential pair under the sessions directory.
    pub credentials_ref: String,

    /// Advanced conditional filters for this account.
    #[serde(default)]
    pub filters: Vec<AccountFilter>,
}

impl AccountConfigEntry {
    /// Builds the inactive account record this entry seeds.
    pub fn to_account(&self) -> Account {
        Account::new(&self.id, &self.tenant_id, &self.display_name, &self.credentials_ref)
    }
}

/// Container for account configurations loaded from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfigFile {
    /// The seeded accounts.
    pub accounts: Vec<AccountConfigEntry>,
}

/// Errors that can occur while loading account configurations.
#[derive(Debug, Error)]
pub enum AccountLoaderError {
    /// Error when reading the account configuration file.
    #[error("Failed to load account configuration: {0}")]
    IoError(std::io::Error),

    /// Error when parsing the account configuration file.
    #[error("Failed to parse account configuration: {0}")]
    ParseError(String),

    /// Error when the account configuration format is unsupported.
    #[error("Unsupported account configuration format")]
    UnsupportedFormat,

    /// An entry is missing a required field.
    #[error("Invalid account entry '{id}': {reason}")]
    InvalidEntry {
        /// Id of the offending entry.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Loads account configurations from a file.
pub struct AccountLoader {
    path: PathBuf,
}

impl AccountLoader {
    /// Creates a new `AccountLoader` instance.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the account configuration from the specified file.
    pub fn load(&self) -> Result<Vec<AccountConfigEntry>, AccountLoaderError> {
        if !is_yaml_file(&self.path) {
            return Err(AccountLoaderError::UnsupportedFormat);
        }

        let config_str = fs::read_to_string(&self.path).map_err(AccountLoaderError::IoError)?;
        let config: AccountConfigFile = Config::builder()
            .add_source(File::from_str(&config_str, config::FileFormat::Yaml))
            .build()
            .map_err(|e| AccountLoaderError::ParseError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AccountLoaderError::ParseError(e.to_string()))?;

        for entry in &config.accounts {
            if entry.credentials_ref.trim().is_empty() {
                return Err(AccountLoaderError::InvalidEntry {
                    id: entry.id.clone(),
                    reason: "credentials_ref must not be empty".to_string(),
                });
            }
        }

        Ok(config.accounts)
    }
}

pub(super) fn is_yaml_file(path: &std::path::Path) -> bool {
    matches!(path.extension().and_then(|ext| ext.to_str()), Some("yaml") | Some("yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(filename: &str, content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(filename);
        fs::write(&path, content).expect("Failed to write YAML file");
        (temp_dir, path)
    }

    #[test]
    fn test_load_valid_accounts() {
        let content = r#"
accounts:
  - id: "acct-main"
    tenant_id: "tenant-a"
    display_name: "Main monitor"
    credentials_ref: "main"
    filters:
      - name: "urgent"
        actions: ["tag:urgent"]
        conditions:
          - type: text_contains
            value: "urgent"
  - id: "acct-backup"
    tenant_id: "tenant-a"
    display_name: "Backup"
    credentials_ref: "backup"
"#;
        let (_temp_dir, path) = write_config("accounts.yaml", content.trim());
        let accounts = AccountLoader::new(path).load().unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "acct-main");
        assert_eq!(accounts[0].filters.len(), 1);
        assert_eq!(accounts[0].filters[0].name, "urgent");
        assert!(accounts[1].filters.is_empty());

        let account = accounts[1].to_account();
        assert_eq!(account.tenant_id, "tenant-a");
        assert_eq!(account.credentials_ref, "backup");
    }

    #[test]
    fn test_load_rejects_empty_credentials_ref() {
        let content = r#"
accounts:
  - id: "acct-bad"
    tenant_id: "tenant-a"
    display_name: "Bad"
    credentials_ref: ""
"#;
        let (_temp_dir, path) = write_config("accounts.yaml", content.trim());
        let result = AccountLoader::new(path).load();
        assert!(matches!(result, Err(AccountLoaderError::InvalidEntry { .. })));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let (_temp_dir, path) = write_config("accounts.json", "accounts: []");
        let result = AccountLoader::new(path).load();
        assert!(matches!(result, Err(AccountLoaderError::UnsupportedFormat)));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = AccountLoader::new(temp_dir.path().join("missing.yaml")).load();
        assert!(matches!(result, Err(AccountLoaderError::IoError(_))));
    }
}
