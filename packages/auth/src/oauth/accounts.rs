// ABOUTME: Account lifecycle on top of the authorization flow and token store
// ABOUTME: Adds, removes, lists, and reports status while keeping config.json and tokens/ in step

use gcal_config::{AccountConfig, AccountsConfig, ConfigDir};
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        coordinator::AuthorizationCoordinator,
        storage::{validate_account_name, TokenStore},
    },
};

/// Authorization status of one configured account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStatus {
    pub name: String,
    pub email: Option<String>,
    pub has_token: bool,
    pub expired: bool,
    pub refreshable: bool,
}

/// Account management for the CLI
pub struct AccountManager {
    dir: ConfigDir,
    store: TokenStore,
    coordinator: AuthorizationCoordinator,
}

impl AccountManager {
    pub fn new(coordinator: AuthorizationCoordinator, dir: ConfigDir) -> Self {
        Self {
            store: TokenStore::new(dir.clone()),
            dir,
            coordinator,
        }
    }

    pub fn config_dir(&self) -> &ConfigDir {
        &self.dir
    }

    /// Authorize a new account (or re-authorize with `force`) and record it,
    /// reading the manual fallback from stdin.
    ///
    /// If the token was saved but the identity lookup failed, the account is
    /// still recorded without an email and the lookup error is returned.
    pub async fn add_account(&self, name: &str, force: bool) -> AuthResult<AccountConfig> {
        self.ensure_addable(name, force)?;
        let outcome = self.coordinator.authorize(name).await;
        self.record(name, outcome)
    }

    /// Same as [`add_account`](Self::add_account), reading manual input from `input`.
    pub async fn add_account_with_input<R>(
        &self,
        name: &str,
        force: bool,
        input: R,
    ) -> AuthResult<AccountConfig>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        self.ensure_addable(name, force)?;
        let outcome = self.coordinator.authorize_with_input(name, input).await;
        self.record(name, outcome)
    }

    fn ensure_addable(&self, name: &str, force: bool) -> AuthResult<()> {
        validate_account_name(name)?;

        let config = AccountsConfig::load(&self.dir)?;
        if config.contains(name) && !force {
            return Err(AuthError::AccountExists(name.to_string()));
        }
        Ok(())
    }

    fn record(&self, name: &str, outcome: AuthResult<String>) -> AuthResult<AccountConfig> {
        let (email, lookup_error) = match outcome {
            Ok(email) => (Some(email), None),
            Err(e @ AuthError::IdentityLookup(_)) => (None, Some(e)),
            Err(e) => return Err(e),
        };

        // Reload so a concurrent change to another account is not lost
        let mut config = AccountsConfig::load(&self.dir)?;
        let account = AccountConfig {
            name: name.to_string(),
            email,
        };
        config.upsert(account.clone());
        config.save(&self.dir)?;

        match lookup_error {
            Some(e) => {
                warn!("Account '{}' recorded without an email", name);
                Err(e)
            }
            None => {
                info!("✅ Account '{}' added", name);
                Ok(account)
            }
        }
    }

    /// Remove an account's token and config entry
    pub fn remove_account(&self, name: &str) -> AuthResult<()> {
        validate_account_name(name)?;

        let mut config = AccountsConfig::load(&self.dir)?;
        if !config.contains(name) {
            return Err(AuthError::AccountNotFound(name.to_string()));
        }

        self.store.remove(name)?;
        config.remove(name);
        config.save(&self.dir)?;

        info!("Removed account '{}'", name);
        Ok(())
    }

    /// Configured accounts sorted by name
    pub fn list_accounts(&self) -> AuthResult<Vec<AccountConfig>> {
        let config = AccountsConfig::load(&self.dir)?;
        Ok(config.accounts.into_values().collect())
    }

    pub fn status(&self) -> AuthResult<Vec<AccountStatus>> {
        let config = AccountsConfig::load(&self.dir)?;
        let mut statuses = Vec::with_capacity(config.accounts.len());

        for account in config.accounts.into_values() {
            let (has_token, expired, refreshable) = match self.store.load(&account.name) {
                Ok(credential) => (
                    true,
                    credential.token.is_expired(),
                    credential.token.has_refresh_token(),
                ),
                Err(e) if e.is_not_found() => (false, false, false),
                Err(e) => {
                    warn!("Token for '{}' unreadable: {}", account.name, e);
                    (false, false, false)
                }
            };

            statuses.push(AccountStatus {
                name: account.name,
                email: account.email,
                has_token,
                expired,
                refreshable,
            });
        }

        Ok(statuses)
    }
}
