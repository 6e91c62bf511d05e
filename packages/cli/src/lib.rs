// ABOUTME: Library half of the gcal account management CLI
// ABOUTME: Tracing setup and construction of the account manager from the environment

pub mod logging;

use gcal_auth::{AccountManager, AuthorizationCoordinator};
use gcal_config::{AuthSettings, ConfigDir};

/// Build an account manager from `GCAL_*` environment variables
pub fn account_manager_from_env() -> anyhow::Result<AccountManager> {
    let dir = ConfigDir::from_env()?;
    let settings = AuthSettings::from_env()?;
    tracing::debug!(
        "Using config dir {} with callback port {}",
        dir.root().display(),
        settings.callback_port
    );

    let coordinator = AuthorizationCoordinator::new(dir.clone(), settings);
    Ok(AccountManager::new(coordinator, dir))
}
