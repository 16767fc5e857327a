//! Client configuration loaded from the environment.
//!
//! A `.env` file in the working directory is honoured outside of tests.

use std::env;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_DB_URL: &str = "sqlite://reasoning.sqlite3";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    pub api_base_url: String,
    /// Where the credential is persisted between runs.
    pub database_url: String,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            database_url: DEFAULT_DB_URL.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `REASONING_API_URL`, `REASONING_DB_URL` and `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the API URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let defaults = Self::default();
        let api_base_url = env::var("REASONING_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.api_base_url);
        let database_url = env::var("REASONING_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.database_url);
        let log_filter = env::var("RUST_LOG").unwrap_or(defaults.log_filter);

        Self {
            api_base_url,
            database_url,
            log_filter,
        }
        .validated()
    }

    /// Replace the API base URL, e.g. from a command-line flag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the URL is not an http(s) URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        self.api_base_url = url.into();
        self.validated()
    }

    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: "REASONING_API_URL",
                reason: format!("expected an http(s) URL, got {trimmed:?}"),
            });
        }
        self.api_base_url = trimmed.to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let config = ClientConfig::default()
            .with_api_base_url("https://api.example.com/v1/ ")
            .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/v1");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = ClientConfig::default()
            .with_api_base_url("ftp://example.com")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "REASONING_API_URL", .. }));
    }
}
