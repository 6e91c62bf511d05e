// ABOUTME: Best-effort browser launching for the consent page
// ABOUTME: Fire-and-forget: failures are logged and never affect the flow outcome

use tracing::{debug, warn};

/// Presents the authorization URL to the operator. Implementations never
/// report failure.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self, account_name: &str, url: &str);
}

/// Prints operator instructions to stderr and opens the system browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn launch(&self, account_name: &str, url: &str) {
        eprintln!("\n=== OAuth Authentication for account '{}' ===", account_name);
        eprintln!("\n1. Opening browser for authentication...");
        eprintln!("\n2. If the callback doesn't work, copy the authorization code from the URL");
        eprintln!("   (the 'code' parameter) and paste it below.");
        eprintln!("\nAuth URL (if browser doesn't open):\n{}\n", url);
        eprintln!("Paste authorization code here (or wait for automatic callback): ");

        match open::that(url) {
            Ok(()) => debug!("Opened browser for authorization"),
            Err(e) => warn!("Failed to open browser: {}", e),
        }
    }
}

/// Launcher that does nothing, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn launch(&self, _account_name: &str, _url: &str) {}
}
