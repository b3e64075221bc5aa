//! Client configuration.
//!
//! `ClientConfig` can be built in code, deserialized from any serde format,
//! or read from `ASANA_*` environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `https://app.asana.com/api/1.0`. Trailing slashes are
    /// stripped.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub token: Option<String>,
    /// Per-request timeout handed to the transport.
    #[serde(with = "secs")]
    pub timeout: Option<Duration>,
    /// Upper bound on pages fetched by a single `all_*` walk. `None` trusts
    /// the server's cursor to terminate.
    pub max_pages: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Some(DEFAULT_TIMEOUT),
            max_pages: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Read `ASANA_BASE_URL`, `ASANA_TOKEN`, `ASANA_TIMEOUT_SECS` and
    /// `ASANA_MAX_PAGES`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(url) = lookup("ASANA_BASE_URL") {
            config.base_url = url;
        }
        config.token = lookup("ASANA_TOKEN").filter(|t| !t.is_empty());
        if let Some(raw) = lookup("ASANA_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ApiError::Configuration(format!("ASANA_TIMEOUT_SECS: not a number: {raw}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup("ASANA_MAX_PAGES") {
            let pages: usize = raw
                .parse()
                .map_err(|_| ApiError::Configuration(format!("ASANA_MAX_PAGES: not a number: {raw}")))?;
            config.max_pages = Some(pages);
        }
        Ok(config)
    }

    /// Normalize and check the configuration. Returns the base URL with
    /// trailing slashes removed.
    pub(crate) fn validated_base_url(&self) -> Result<String, ApiError> {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ApiError::Configuration("base_url is empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ApiError::Configuration(format!(
                "base_url must start with http:// or https://: {base}"
            )));
        }
        if self.max_pages == Some(0) {
            return Err(ApiError::Configuration("max_pages must be positive".to_string()));
        }
        Ok(base.to_string())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
