// Client configuration
//
// Defaults point at the public restful-booker deployment. Every field can be
// overridden from the environment so the live suite can target another host.

use crate::auth::Credentials;
use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://restful-booker.herokuapp.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_BASE_URL: &str = "BOOKER_BASE_URL";
pub const ENV_USERNAME: &str = "BOOKER_USERNAME";
pub const ENV_PASSWORD: &str = "BOOKER_PASSWORD";
pub const ENV_TIMEOUT_MS: &str = "BOOKER_TIMEOUT_MS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    // Admin pair used to fetch a token before every mutating call
    pub credentials: Credentials,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::admin(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Split out from `from_env` so tests don't have to mutate process state
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            config.credentials.username = username;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.credentials.password = password;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw.trim().parse().map_err(|_| {
                ClientError::ConfigError(format!("{} must be an integer, got {:?}", ENV_TIMEOUT_MS, raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ClientError::ConfigError(format!("invalid base url {:?}: {}", self.base_url, e))
        })?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::ConfigError(format!(
                "base url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
