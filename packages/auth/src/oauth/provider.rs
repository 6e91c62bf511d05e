// ABOUTME: Google OAuth client configuration and token endpoint calls
// ABOUTME: Parses installed-app credentials.json, builds consent URLs, exchanges and refreshes tokens

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::{OAuthToken, PkceChallenge, TokenResponse},
};

/// Read-only calendar access. Never widened at runtime.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar.readonly"];

/// OAuth client from the operator-supplied credentials file
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(rename = "auth_uri")]
    pub auth_url: String,
    #[serde(rename = "token_uri")]
    pub token_url: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// Top-level shape of a Google client secrets file
#[derive(Deserialize)]
struct CredentialsFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

impl ClientCredentials {
    /// Load credentials.json. A missing or unreadable file is a configuration
    /// problem, malformed content is a parse problem.
    pub fn load(path: &Path) -> AuthResult<Self> {
        let data = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AuthError::Config(format!(
                "credentials.json not found. Please place your Google OAuth credentials at: {}",
                path.display()
            )),
            _ => AuthError::Config(format!(
                "Failed to read credentials file {}: {}",
                path.display(),
                e
            )),
        })?;

        Self::from_json(&data)
    }

    pub fn from_json(data: &[u8]) -> AuthResult<Self> {
        let file: CredentialsFile = serde_json::from_slice(data)
            .map_err(|e| AuthError::Parse(format!("Failed to parse credentials: {}", e)))?;

        let credentials = file.installed.or(file.web).ok_or_else(|| {
            AuthError::Parse(
                "Failed to parse credentials: expected an \"installed\" or \"web\" client"
                    .to_string(),
            )
        })?;

        if credentials.client_id.trim().is_empty() {
            return Err(AuthError::Parse(
                "Failed to parse credentials: client_id is empty".to_string(),
            ));
        }

        Ok(credentials)
    }
}

/// Token endpoint client for one set of client credentials
#[derive(Debug, Clone)]
pub struct OAuthClient {
    credentials: ClientCredentials,
    http: Client,
}

impl OAuthClient {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_http_client(credentials, Client::new())
    }

    pub fn with_http_client(credentials: ClientCredentials, http: Client) -> Self {
        Self { credentials, http }
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Build the consent URL: offline access, forced consent, PKCE S256, CSRF state
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        pkce: &PkceChallenge,
    ) -> AuthResult<String> {
        let mut url = Url::parse(&self.credentials.auth_url)
            .map_err(|e| AuthError::Config(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("prompt", "consent")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method);

        Ok(url.to_string())
    }

    /// Exchange authorization code for a token
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> AuthResult<OAuthToken> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.credentials.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = &self.credentials.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        debug!("Exchanging authorization code at {}", self.credentials.token_url);
        let response = self.post_token_request(&params).await?;
        Ok(response.into_token(Utc::now()))
    }

    /// Mint a new access token from the stored refresh token.
    /// Keeps the old refresh token when the provider does not rotate it.
    pub async fn refresh(&self, token: &OAuthToken) -> AuthResult<OAuthToken> {
        if !token.has_refresh_token() {
            return Err(AuthError::Exchange(
                "No refresh token available; re-authorize the account".to_string(),
            ));
        }

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", token.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
        ];
        if let Some(secret) = &self.credentials.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        debug!("Refreshing access token at {}", self.credentials.token_url);
        let response = self.post_token_request(&params).await?;

        let mut refreshed = response.into_token(Utc::now());
        if refreshed.refresh_token.is_empty() {
            refreshed.refresh_token = token.refresh_token.clone();
        }
        for (key, value) in &token.extra {
            refreshed
                .extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(refreshed)
    }

    async fn post_token_request(&self, params: &[(&str, &str)]) -> AuthResult<TokenResponse> {
        let response = self
            .http
            .post(&self.credentials.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // Only the OAuth error code is surfaced, never the full body
            let reason = response
                .json::<ProviderError>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "unknown_error".to_string());
            error!("Token endpoint returned {} ({})", status, reason);
            return Err(AuthError::Exchange(format!(
                "Token endpoint returned {} ({})",
                status, reason
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Exchange(format!("Failed to parse token response: {}", e)))
    }
}

#[derive(Deserialize)]
struct ProviderError {
    error: String,
}
