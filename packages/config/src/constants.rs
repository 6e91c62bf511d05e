// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across gcal

// Directory Configuration
pub const GCAL_CONFIG_DIR: &str = "GCAL_CONFIG_DIR";

// OAuth Flow Configuration
pub const GCAL_CALLBACK_PORT: &str = "GCAL_CALLBACK_PORT";
pub const GCAL_AUTH_TIMEOUT_SECS: &str = "GCAL_AUTH_TIMEOUT_SECS";

// Calendar API Configuration
pub const GCAL_API_BASE_URL: &str = "GCAL_API_BASE_URL";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// Defaults
pub const DEFAULT_CALLBACK_PORT: u16 = 8089;
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 5 * 60;
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";
pub const CONFIG_DIR_NAME: &str = "gcal-readonly-mcp";
