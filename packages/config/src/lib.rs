// ABOUTME: Configuration library for gcal account management
// ABOUTME: Directory layout, account registry, owner-only file helpers, and env settings

pub mod accounts;
pub mod constants;
pub mod error;
pub mod fs;
pub mod paths;
pub mod settings;

pub use accounts::{AccountConfig, AccountsConfig};
pub use error::{ConfigError, ConfigResult};
pub use paths::ConfigDir;
pub use settings::AuthSettings;
