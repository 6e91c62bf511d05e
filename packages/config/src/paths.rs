// ABOUTME: Filesystem layout of the gcal configuration directory
// ABOUTME: Resolves config.json, credentials.json, and per-account token paths

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_DIR_NAME, GCAL_CONFIG_DIR};
use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE: &str = "config.json";
const CREDENTIALS_FILE: &str = "credentials.json";
const TOKENS_DIR: &str = "tokens";

/// Root of the on-disk configuration.
///
/// ```text
/// <root>/
///   config.json        account registry
///   credentials.json   OAuth client (operator supplied)
///   tokens/<name>.json one token per account
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from `GCAL_CONFIG_DIR`, falling back to `~/.config/gcal-readonly-mcp`.
    pub fn from_env() -> ConfigResult<Self> {
        if let Ok(dir) = env::var(GCAL_CONFIG_DIR) {
            if !dir.trim().is_empty() {
                return Ok(Self::new(dir));
            }
        }

        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::new(home.join(".config").join(CONFIG_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    pub fn tokens_dir(&self) -> PathBuf {
        self.root.join(TOKENS_DIR)
    }

    /// Token file for an account. The name is used verbatim, callers validate it.
    pub fn token_path(&self, account_name: &str) -> PathBuf {
        self.tokens_dir().join(format!("{}.json", account_name))
    }
}
