// ABOUTME: Account registry persisted as config.json
// ABOUTME: Maps account names to their display name and resolved email address

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::fs::{create_private_dir, write_private_file};
use crate::paths::ConfigDir;

/// Configuration for a single calendar account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Contents of config.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,
}

impl AccountsConfig {
    /// Load config.json. A missing file yields an empty registry.
    pub fn load(dir: &ConfigDir) -> ConfigResult<Self> {
        let path = dir.config_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        // `null` for accounts is tolerated the same way as a missing field
        let raw: RawAccountsConfig =
            serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            accounts: raw.accounts.unwrap_or_default(),
        })
    }

    /// Write config.json, creating the config and tokens directories if needed.
    pub fn save(&self, dir: &ConfigDir) -> ConfigResult<()> {
        for d in [dir.root().to_path_buf(), dir.tokens_dir()] {
            create_private_dir(&d).map_err(|source| ConfigError::Write {
                path: d.clone(),
                source,
            })?;
        }

        let data = serde_json::to_vec_pretty(self)?;
        let path = dir.config_path();
        write_private_file(&path, &data).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;

        debug!("Saved {} account(s) to {}", self.accounts.len(), path.display());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    pub fn upsert(&mut self, account: AccountConfig) {
        self.accounts.insert(account.name.clone(), account);
    }

    pub fn remove(&mut self, name: &str) -> Option<AccountConfig> {
        self.accounts.remove(name)
    }
}

#[derive(Deserialize)]
struct RawAccountsConfig {
    #[serde(default)]
    accounts: Option<BTreeMap<String, AccountConfig>>,
}
