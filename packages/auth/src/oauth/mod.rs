// ABOUTME: OAuth module for calendar account authorization
// ABOUTME: Callback listener, manual entry, coordinator, token storage, and authenticated clients

pub mod accounts;
pub mod browser;
pub mod coordinator;
pub mod manual;
pub mod pkce;
pub mod provider;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;

pub use accounts::{AccountManager, AccountStatus};
pub use browser::{BrowserLauncher, NoBrowser, SystemBrowser};
pub use coordinator::{AuthorizationCoordinator, SessionState, DEFAULT_SHUTDOWN_GRACE};
pub use manual::ManualCodeReader;
pub use provider::{ClientCredentials, OAuthClient, SCOPES};
pub use server::{CallbackListener, CallbackSignals};
pub use service::{AuthorizedClient, ServiceFactory};
pub use storage::{validate_account_name, TokenStore};
pub use types::{AccountCredential, CodeSource, OAuthToken, PkceChallenge, TokenResponse};
