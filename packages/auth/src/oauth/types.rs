// ABOUTME: Core type definitions for calendar OAuth credentials
// ABOUTME: Token file format, per-account credential records, and provider token responses

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seconds before expiry at which an access token is treated as stale
pub const REFRESH_BUFFER_SECS: i64 = 5 * 60;

/// OAuth token as stored in `tokens/<account>.json`.
///
/// Provider fields this crate does not interpret (scope, id_token, ...) are
/// kept in `extra` and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OAuthToken {
    /// Check if token is expired with 5-minute buffer.
    /// Tokens without an expiry never expire.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry < Utc::now() + Duration::seconds(REFRESH_BUFFER_SECS),
            None => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// One account's credential, keyed by account name
#[derive(Debug, Clone, PartialEq)]
pub struct AccountCredential {
    pub account_name: String,
    pub token: OAuthToken,
}

impl AccountCredential {
    pub fn new(account_name: impl Into<String>, token: OAuthToken) -> Self {
        Self {
            account_name: account_name.into(),
            token,
        }
    }
}

/// OAuth token response from provider
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>, // Seconds
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Convert into a storable token, computing the absolute expiry from `now`.
    pub fn into_token(self, now: DateTime<Utc>) -> OAuthToken {
        OAuthToken {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self.refresh_token.unwrap_or_default(),
            expiry: self
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| now + Duration::seconds(secs)),
            extra: self.extra,
        }
    }
}

/// PKCE challenge for OAuth flow
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String, // Usually "S256"
}

/// Where a winning authorization code came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSource {
    Callback,
    Manual,
}

impl std::fmt::Display for CodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callback => write!(f, "browser callback"),
            Self::Manual => write!(f, "manual input"),
        }
    }
}
