// ABOUTME: Authenticated calendar API clients built from stored credentials
// ABOUTME: Refreshes expired access tokens and resolves the account's primary calendar identity

use gcal_config::ConfigDir;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        provider::{ClientCredentials, OAuthClient},
        storage::TokenStore,
        types::{AccountCredential, OAuthToken},
    },
};

/// Produces authenticated clients for configured accounts.
///
/// Every call re-reads credentials.json and the account's token file so a
/// client never starts from stale state.
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    dir: ConfigDir,
    api_base_url: String,
    http: Client,
}

impl ServiceFactory {
    pub fn new(dir: ConfigDir, api_base_url: impl Into<String>) -> Self {
        Self {
            dir,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn client_for(&self, account_name: &str) -> AuthResult<AuthorizedClient> {
        let credentials = ClientCredentials::load(&self.dir.credentials_path())?;
        let store = TokenStore::new(self.dir.clone());
        let credential = store.load(account_name)?;
        Ok(self.client_from(OAuthClient::new(credentials), credential))
    }

    /// Build a client from an already loaded credential
    pub fn client_from(
        &self,
        oauth: OAuthClient,
        credential: AccountCredential,
    ) -> AuthorizedClient {
        AuthorizedClient {
            account_name: credential.account_name,
            oauth,
            store: TokenStore::new(self.dir.clone()),
            http: self.http.clone(),
            api_base_url: self.api_base_url.clone(),
            token: Mutex::new(credential.token),
        }
    }
}

/// HTTP client bound to one account's token
pub struct AuthorizedClient {
    account_name: String,
    oauth: OAuthClient,
    store: TokenStore,
    http: Client,
    api_base_url: String,
    token: Mutex<OAuthToken>,
}

#[derive(Deserialize)]
struct CalendarListEntry {
    id: String,
}

impl AuthorizedClient {
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Current access token, refreshed first if it is expired.
    /// A refreshed token is written back to the token store.
    pub async fn access_token(&self) -> AuthResult<String> {
        let mut token = self.token.lock().await;
        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        info!("Access token for {} expired, refreshing", self.account_name);
        let refreshed = self.oauth.refresh(&token).await?;

        let credential = AccountCredential::new(self.account_name.clone(), refreshed.clone());
        if let Err(e) = self.store.save(&credential) {
            warn!("Refreshed token for {} not persisted: {}", self.account_name, e);
        }

        *token = refreshed;
        Ok(token.access_token.clone())
    }

    /// Start an authorized request against the calendar API
    pub async fn request(&self, method: Method, path: &str) -> AuthResult<RequestBuilder> {
        let access_token = self.access_token().await?;
        let url = format!("{}/{}", self.api_base_url, path.trim_start_matches('/'));
        Ok(self.http.request(method, url).bearer_auth(access_token))
    }

    /// Email address of the account, taken from its primary calendar id
    pub async fn primary_calendar_id(&self) -> AuthResult<String> {
        let lookup = async {
            let response = self
                .request(Method::GET, "calendar/v3/users/me/calendarList/primary")
                .await?
                .send()
                .await
                .map_err(|e| AuthError::IdentityLookup(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AuthError::IdentityLookup(format!(
                    "Failed to get primary calendar: status {}",
                    status
                )));
            }

            let entry: CalendarListEntry = response.json().await.map_err(|e| {
                AuthError::IdentityLookup(format!("Failed to parse primary calendar: {}", e))
            })?;
            Ok::<_, AuthError>(entry.id)
        };

        let id = lookup.await.map_err(|e| match e {
            AuthError::IdentityLookup(_) => e,
            other => AuthError::IdentityLookup(other.to_string()),
        })?;

        debug!("Resolved primary calendar for {}", self.account_name);
        Ok(id)
    }
}
