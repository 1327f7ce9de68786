//! Connection settings for `Api`.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_API_HOST: &str = "https://stage-api.ioka.kz";
pub const DEFAULT_VERSION: &str = "v2";

/// Secret sent in the `API-KEY` header. Formatting never reveals it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**********)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("**********")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_host: String,
    api_key: ApiKey,
    version: String,
    timeout: Option<Duration>,
}

impl ApiConfig {
    /// Staging host, API version `v2`, no timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: ApiKey::new(api_key),
            version: DEFAULT_VERSION.to_string(),
            timeout: None,
        }
    }

    /// Reads `IOKA_API_KEY` (required), `IOKA_API_HOST`, `IOKA_API_VERSION`
    /// and `IOKA_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup("IOKA_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::Config("IOKA_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Some(host) = lookup("IOKA_API_HOST") {
            config = config.with_host(&host)?;
        }
        if let Some(version) = lookup("IOKA_API_VERSION") {
            config = config.with_version(version);
        }
        if let Some(ms) = lookup("IOKA_TIMEOUT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| ApiError::Config(format!("IOKA_TIMEOUT_MS is not a number: {ms:?}")))?;
            config = config.with_timeout(Duration::from_millis(ms));
        }
        Ok(config)
    }

    /// Fails unless `host` is an absolute http(s) URL. A trailing `/` is dropped.
    pub fn with_host(mut self, host: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(host).map_err(|e| ApiError::Config(format!("api_host {host:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "api_host {host:?}: scheme must be http or https"
            )));
        }
        self.api_host = host.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into().trim_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
