// ABOUTME: Orchestrates one interactive OAuth authorization for a calendar account
// ABOUTME: Races the loopback callback against manual entry under a deadline, then exchanges and persists

use gcal_config::{AuthSettings, ConfigDir};
use reqwest::Client;
use std::{sync::Arc, time::Duration};
use tokio::{
    io::AsyncBufRead,
    sync::mpsc,
    time::{sleep_until, Instant},
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        browser::{BrowserLauncher, SystemBrowser},
        manual::ManualCodeReader,
        pkce::generate_pkce_challenge,
        provider::{ClientCredentials, OAuthClient},
        server::{CallbackListener, CallbackSignals},
        service::ServiceFactory,
        storage::{validate_account_name, TokenStore},
        types::{AccountCredential, CodeSource},
    },
};

/// Bounded wait for the callback listener to stop before it is force-closed
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ListenerStarted,
    AwaitingCode,
    Exchanging,
    Succeeded,
    Failed,
}

/// Ephemeral per-call session, never shared across accounts
#[derive(Debug)]
struct AuthorizationSession {
    state: SessionState,
    redirect_port: u16,
    deadline: Instant,
}

impl AuthorizationSession {
    fn new(redirect_port: u16, timeout: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            redirect_port,
            deadline: Instant::now() + timeout,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            "Authorization session on port {}: {:?} -> {:?}",
            self.redirect_port, self.state, next
        );
        self.state = next;
    }
}

/// Runs the authorization code flow for one account at a time
pub struct AuthorizationCoordinator {
    dir: ConfigDir,
    settings: AuthSettings,
    shutdown_grace: Duration,
    browser: Arc<dyn BrowserLauncher>,
    http: Client,
}

impl AuthorizationCoordinator {
    pub fn new(dir: ConfigDir, settings: AuthSettings) -> Self {
        Self {
            dir,
            settings,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            browser: Arc::new(SystemBrowser),
            http: Client::new(),
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Authorize `account_name` interactively, reading the manual fallback
    /// from stdin. Returns the account's email address.
    pub async fn authorize(&self, account_name: &str) -> AuthResult<String> {
        self.run(account_name, ManualCodeReader::spawn_stdin).await
    }

    /// Authorize `account_name`, reading the manual fallback from `input`.
    pub async fn authorize_with_input<R>(&self, account_name: &str, input: R) -> AuthResult<String>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        self.run(account_name, move || ManualCodeReader::spawn(input))
            .await
    }

    /// Run one authorization. This will:
    /// 1. Load the OAuth client from credentials.json
    /// 2. Start the callback listener on the fixed port
    /// 3. Start the manual reader and present the consent URL
    /// 4. Wait for the first code, callback error, or the deadline
    /// 5. Shut the listener down (always, before returning)
    /// 6. Exchange the code, persist the token, look up the account email
    async fn run<F>(&self, account_name: &str, start_reader: F) -> AuthResult<String>
    where
        F: FnOnce() -> (ManualCodeReader, mpsc::Receiver<String>) + Send,
    {
        validate_account_name(account_name)?;
        info!("Starting OAuth authorization for account: {}", account_name);

        let credentials = ClientCredentials::load(&self.dir.credentials_path())?;
        let oauth = OAuthClient::with_http_client(credentials, self.http.clone());

        let mut session =
            AuthorizationSession::new(self.settings.callback_port, self.settings.timeout);
        let pkce = generate_pkce_challenge();
        let csrf_state = nanoid::nanoid!();

        let (listener, signals) =
            CallbackListener::bind(session.redirect_port, Some(csrf_state.clone())).await?;
        session.transition(SessionState::ListenerStarted);
        let redirect_uri = listener.redirect_uri();

        let (reader, manual_rx) = start_reader();

        let outcome = match oauth.authorization_url(&redirect_uri, &csrf_state, &pkce) {
            Ok(auth_url) => {
                self.browser.launch(account_name, &auth_url);
                session.transition(SessionState::AwaitingCode);
                self.wait_for_code(&session, signals, manual_rx).await
            }
            Err(e) => Err(e),
        };

        // Every path past bind goes through here
        reader.cancel();
        listener.shutdown(self.shutdown_grace).await;

        let (code, source) = match outcome {
            Ok(received) => received,
            Err(e) => {
                session.transition(SessionState::Failed);
                error!("Authorization for {} failed: {}", account_name, e);
                return Err(e);
            }
        };
        info!("Authorization code received via {}, exchanging for token", source);

        session.transition(SessionState::Exchanging);
        let token = match oauth
            .exchange_code(&code, &redirect_uri, &pkce.code_verifier)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                session.transition(SessionState::Failed);
                return Err(e);
            }
        };

        let credential = AccountCredential::new(account_name, token);
        if let Err(e) = TokenStore::new(self.dir.clone()).save(&credential) {
            session.transition(SessionState::Failed);
            return Err(e);
        }
        session.transition(SessionState::Succeeded);

        // The token stays saved even if this fails
        let client = ServiceFactory::new(self.dir.clone(), self.settings.api_base_url.clone())
            .client_from(oauth, credential);
        let email = client.primary_calendar_id().await.map_err(|e| {
            warn!("Token for {} saved but identity lookup failed: {}", account_name, e);
            e
        })?;

        info!("✅ Account '{}' authorized as {}", account_name, email);
        Ok(email)
    }

    async fn wait_for_code(
        &self,
        session: &AuthorizationSession,
        mut signals: CallbackSignals,
        mut manual_rx: mpsc::Receiver<String>,
    ) -> AuthResult<(String, CodeSource)> {
        tokio::select! {
            Some(code) = signals.code_rx.recv() => Ok((code, CodeSource::Callback)),
            Some(err) = signals.error_rx.recv() => Err(err),
            Some(code) = manual_rx.recv() => Ok((code, CodeSource::Manual)),
            _ = sleep_until(session.deadline) => {
                Err(AuthError::Timeout(self.settings.timeout))
            }
        }
    }
}
