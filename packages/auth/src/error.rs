// ABOUTME: Error types for the authorization flow and credential lifecycle
// ABOUTME: One variant per failure class so callers can branch without string matching

use std::time::Duration;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Credentials file missing or unreadable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed credentials, token, or config JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// No token stored for the account yet
    #[error("No token found for account '{0}'")]
    NotFound(String),

    /// Cannot bind the callback port, or the callback carried no code
    #[error("Callback listener error: {0}")]
    Listener(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Timed out after {0:?} waiting for authorization")]
    Timeout(Duration),

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Token was saved but the account identity could not be resolved
    #[error("Identity lookup failed: {0}")]
    IdentityLookup(String),

    #[error("Invalid account name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidAccountName(String),

    #[error("Account '{0}' already exists")]
    AccountExists(String),

    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    #[error("State mismatch: CSRF protection failed")]
    StateMismatch,
}

impl AuthError {
    /// True for the expected "not authorized yet" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<gcal_config::ConfigError> for AuthError {
    fn from(err: gcal_config::ConfigError) -> Self {
        use gcal_config::ConfigError;
        match err {
            ConfigError::Parse { .. } => Self::Parse(err.to_string()),
            ConfigError::Write { .. } | ConfigError::Serialize(_) => {
                Self::Persistence(err.to_string())
            }
            _ => Self::Config(err.to_string()),
        }
    }
}
