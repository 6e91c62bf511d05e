// ABOUTME: Common test utilities for authorization integration tests
// ABOUTME: Temp config dirs, mock provider endpoints, and scripted browser/operator stand-ins

#![allow(dead_code)]

use gcal_auth::{AuthorizationCoordinator, BrowserLauncher};
use gcal_config::{AuthSettings, ConfigDir};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tempfile::TempDir;
use url::Url;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TOKEN_PATH: &str = "/token";
pub const PRIMARY_CALENDAR_PATH: &str = "/calendar/v3/users/me/calendarList/primary";

/// Isolated config directory plus a mock Google endpoint
pub struct TestContext {
    pub dir: ConfigDir,
    pub server: MockServer,
    pub port: u16,
    pub _temp_dir: TempDir,
}

impl TestContext {
    /// Config dir without credentials.json
    pub async fn empty() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let dir = ConfigDir::new(temp_dir.path().join("gcal"));
        let server = MockServer::start().await;
        let port = portpicker::pick_unused_port().expect("no free port");

        Self {
            dir,
            server,
            port,
            _temp_dir: temp_dir,
        }
    }

    /// Config dir with credentials.json pointing at the mock token endpoint
    pub async fn new() -> Self {
        let ctx = Self::empty().await;
        std::fs::create_dir_all(ctx.dir.root()).unwrap();
        std::fs::write(ctx.dir.credentials_path(), ctx.credentials_json()).unwrap();
        ctx
    }

    pub fn credentials_json(&self) -> String {
        serde_json::json!({
            "installed": {
                "client_id": "test-client.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": format!("{}{}", self.server.uri(), TOKEN_PATH),
                "redirect_uris": ["http://localhost"]
            }
        })
        .to_string()
    }

    pub fn settings(&self, timeout: Duration) -> AuthSettings {
        AuthSettings {
            callback_port: self.port,
            timeout,
            api_base_url: self.server.uri(),
        }
    }

    pub fn coordinator(
        &self,
        timeout: Duration,
        browser: Arc<dyn BrowserLauncher>,
    ) -> AuthorizationCoordinator {
        AuthorizationCoordinator::new(self.dir.clone(), self.settings(timeout))
            .with_browser(browser)
            .with_shutdown_grace(Duration::from_millis(500))
    }

    /// Token endpoint that accepts exactly `code` and issues `access_token`
    pub async fn mock_exchange(&self, code: &str, access_token: &str) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains(format!("code={}", code)))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "refresh_token": "refresh-1",
                "token_type": "Bearer",
                "expires_in": 3599,
                "scope": "https://www.googleapis.com/auth/calendar.readonly"
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Primary calendar lookup answering for `access_token`
    pub async fn mock_identity(&self, access_token: &str, email: &str) {
        Mock::given(method("GET"))
            .and(path(PRIMARY_CALENDAR_PATH))
            .and(header("authorization", format!("Bearer {}", access_token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": email,
                "summary": email,
                "primary": true
            })))
            .mount(&self.server)
            .await;
    }
}

/// Browser stand-in that follows the redirect after `delay`, as if the
/// operator had approved consent. `code: None` sends a callback without a code.
pub struct RedirectingBrowser {
    pub code: Option<String>,
    pub delay: Duration,
}

impl RedirectingBrowser {
    pub fn with_code(code: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            code: Some(code.to_string()),
            delay,
        })
    }

    pub fn without_code(delay: Duration) -> Arc<Self> {
        Arc::new(Self { code: None, delay })
    }
}

impl BrowserLauncher for RedirectingBrowser {
    fn launch(&self, _account_name: &str, url: &str) {
        let auth_url = Url::parse(url).unwrap();
        let query: HashMap<_, _> = auth_url.query_pairs().into_owned().collect();

        let mut redirect =
            Url::parse(&query["redirect_uri"].replace("localhost", "127.0.0.1")).unwrap();
        {
            let mut pairs = redirect.query_pairs_mut();
            if let Some(code) = &self.code {
                pairs.append_pair("code", code);
            }
            pairs.append_pair("state", &query["state"]);
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = reqwest::get(redirect).await;
        });
    }
}
