// ABOUTME: gcal authentication library for multi-account Google Calendar access
// ABOUTME: Interactive OAuth with loopback and manual code entry, plus owner-only token storage

pub mod error;
pub mod oauth;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use oauth::{
    AccountCredential, AccountManager, AccountStatus, AuthorizationCoordinator, AuthorizedClient,
    BrowserLauncher, CallbackListener, ClientCredentials, ManualCodeReader, NoBrowser,
    OAuthClient, OAuthToken, ServiceFactory, SystemBrowser, TokenStore,
};
