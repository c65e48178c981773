//! Client configuration: credentials, host, and timeout.

use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Public production endpoint.
pub const DEFAULT_HOST: &str = "https://app.datadoghq.com";

/// Default bound on a single request when the caller gives no cancel signal.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Raised when a configuration cannot be built or is invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key not found. Set DD_API_KEY (or DATADOG_API_KEY) or pass --api-key.")]
    MissingApiKey,

    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

/// Settings a [`Client`](crate::Client) is built from.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub app_key: Option<String>,
    pub host: String,
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("app_key", &self.app_key.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with the given API key and every other field defaulted.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            app_key: None,
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from environment variables.
    ///
    /// - `DD_API_KEY` (or `DATADOG_API_KEY`): required
    /// - `DD_APP_KEY` (or `DD_APPLICATION_KEY`)
    /// - `DD_HOST`: defaults to [`DEFAULT_HOST`]
    /// - `DD_TIMEOUT_SECS`: defaults to 60
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_value("DD_API_KEY")
            .or_else(|| env_value("DATADOG_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key);
        config.app_key = Self::app_key_from_env();
        if let Some(host) = env_value("DD_HOST") {
            config = config.with_host(host);
        }
        if let Some(secs) = env_value("DD_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(format!("DD_TIMEOUT_SECS={secs}")))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// `DD_APP_KEY`, falling back to `DD_APPLICATION_KEY`.
    pub fn app_key_from_env() -> Option<String> {
        env_value("DD_APP_KEY").or_else(|| env_value("DD_APPLICATION_KEY"))
    }

    #[must_use]
    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    /// Override the host. A trailing `/` is dropped so paths join cleanly.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let url = Url::parse(&self.host).map_err(|e| ConfigError::InvalidHost {
            host: self.host.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidHost {
                host: self.host.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("timeout cannot be zero".to_string()));
        }
        Ok(())
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
