// ABOUTME: Runtime settings for the OAuth flow loaded from environment variables
// ABOUTME: Callback port, authorization deadline, and calendar API base URL

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_CALLBACK_PORT, GCAL_API_BASE_URL,
    GCAL_AUTH_TIMEOUT_SECS, GCAL_CALLBACK_PORT,
};
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    pub callback_port: u16,
    pub timeout: Duration,
    pub api_base_url: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            callback_port: DEFAULT_CALLBACK_PORT,
            timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl AuthSettings {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let callback_port = match env::var(GCAL_CALLBACK_PORT) {
            Ok(raw) => {
                let port = raw.trim().parse::<u16>()?;
                if port == 0 {
                    return Err(ConfigError::PortOutOfRange(port));
                }
                port
            }
            Err(_) => defaults.callback_port,
        };

        let timeout = match env::var(GCAL_AUTH_TIMEOUT_SECS) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            Err(_) => defaults.timeout,
        };

        let api_base_url = env::var(GCAL_API_BASE_URL)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        Ok(Self {
            callback_port,
            timeout,
            api_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var(GCAL_CALLBACK_PORT);
        env::remove_var(GCAL_AUTH_TIMEOUT_SECS);
        env::remove_var(GCAL_API_BASE_URL);
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let settings = AuthSettings::from_env().unwrap();
        assert_eq!(settings.callback_port, 8089);
        assert_eq!(settings.timeout, Duration::from_secs(300));
        assert_eq!(settings.api_base_url, "https://www.googleapis.com");
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var(GCAL_CALLBACK_PORT, "9099");
        env::set_var(GCAL_AUTH_TIMEOUT_SECS, "30");
        env::set_var(GCAL_API_BASE_URL, "http://127.0.0.1:1234/");

        let settings = AuthSettings::from_env();
        clear_env();

        let settings = settings.unwrap();
        assert_eq!(settings.callback_port, 9099);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.api_base_url, "http://127.0.0.1:1234");
    }

    #[test]
    #[serial]
    fn test_rejects_zero_port() {
        clear_env();
        env::set_var(GCAL_CALLBACK_PORT, "0");
        let result = AuthSettings::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::PortOutOfRange(0))));
    }

    #[test]
    #[serial]
    fn test_rejects_bad_timeout() {
        clear_env();
        env::set_var(GCAL_AUTH_TIMEOUT_SECS, "soon");
        let result = AuthSettings::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }
}
