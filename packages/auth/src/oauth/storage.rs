// ABOUTME: File-backed storage for per-account OAuth tokens
// ABOUTME: One owner-only JSON file per account under the config tokens/ directory

use gcal_config::{
    fs::{create_private_dir, remove_if_exists, write_private_file},
    ConfigDir,
};
use std::fs;
use std::io;
use tracing::{debug, error, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::{AccountCredential, OAuthToken},
};

/// Account names become file names, so they are restricted to a safe alphabet
pub fn validate_account_name(name: &str) -> AuthResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidAccountName(name.to_string()))
    }
}

/// Token storage rooted at a config directory
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: ConfigDir,
}

impl TokenStore {
    pub fn new(dir: ConfigDir) -> Self {
        Self { dir }
    }

    pub fn config_dir(&self) -> &ConfigDir {
        &self.dir
    }

    /// Load the credential for an account.
    ///
    /// A missing file is `NotFound` (account not authorized yet), unreadable
    /// or malformed content is `Parse`.
    pub fn load(&self, account_name: &str) -> AuthResult<AccountCredential> {
        validate_account_name(account_name)?;
        let path = self.dir.token_path(account_name);
        debug!("Loading token for account {}", account_name);

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AuthError::NotFound(account_name.to_string()));
            }
            Err(e) => {
                return Err(AuthError::Parse(format!(
                    "Failed to read token {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let token: OAuthToken = serde_json::from_slice(&data).map_err(|e| {
            error!("Token file for account {} is corrupt", account_name);
            AuthError::Parse(format!("Failed to parse token {}: {}", path.display(), e))
        })?;

        Ok(AccountCredential::new(account_name, token))
    }

    /// Persist the credential, replacing any previous one for the account.
    pub fn save(&self, credential: &AccountCredential) -> AuthResult<()> {
        validate_account_name(&credential.account_name)?;
        let tokens_dir = self.dir.tokens_dir();

        create_private_dir(&tokens_dir).map_err(|e| {
            AuthError::Persistence(format!(
                "Failed to create token directory {}: {}",
                tokens_dir.display(),
                e
            ))
        })?;

        let data = serde_json::to_vec_pretty(&credential.token)
            .map_err(|e| AuthError::Persistence(format!("Failed to serialize token: {}", e)))?;

        let path = self.dir.token_path(&credential.account_name);
        write_private_file(&path, &data).map_err(|e| {
            AuthError::Persistence(format!("Failed to write token {}: {}", path.display(), e))
        })?;

        debug!("Stored token for account {}", credential.account_name);
        Ok(())
    }

    /// Best-effort delete. A missing file is not an error.
    pub fn remove(&self, account_name: &str) -> AuthResult<()> {
        validate_account_name(account_name)?;
        let path = self.dir.token_path(account_name);

        if let Err(e) = remove_if_exists(&path) {
            warn!("Failed to remove token {}: {}", path.display(), e);
        }
        debug!("Removed token for account {}", account_name);
        Ok(())
    }

    pub fn exists(&self, account_name: &str) -> bool {
        validate_account_name(account_name).is_ok() && self.dir.token_path(account_name).is_file()
    }
}
