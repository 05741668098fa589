//! Relay configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::message::DEFAULT_MAX_LENGTH;
use crate::timestamps::try_parse_timestamp;

pub const DEFAULT_API_BASE: &str = "https://webhook.site";
pub const DEFAULT_TIMESTAMP_FILE: &str = ".webhook_timestamp";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_PRINT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Validated settings for one relay process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    // Required fields
    pub webhook_url: String,

    // Derived from webhook_url and api_base
    pub token: String,
    pub requests_url: String,

    pub api_base: String,
    pub api_key: Option<String>,
    pub check_interval: Duration,
    pub request_timeout: Duration,
    pub timestamp_file: PathBuf,
    pub start_from: Option<DateTime<Utc>>,
    /// Maximum printed length in characters, 0 when truncation is disabled
    pub max_length: usize,
    pub print_timeout: Duration,
}

impl RelayConfig {
    /// Create a configuration with defaults for everything but the webhook URL
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_api_base(webhook_url, DEFAULT_API_BASE)
    }

    /// Create a configuration against a specific request-log host
    pub fn with_api_base(
        webhook_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let webhook_url = webhook_url.into();
        let api_base = api_base.into().trim_end_matches('/').to_string();

        let token = token_from_webhook_url(&webhook_url)?;
        url::Url::parse(&api_base).map_err(|e| {
            ConfigError::InvalidApiBase(format!("{}: {}", api_base, e))
        })?;
        let requests_url = format!("{}/token/{}/requests", api_base, token);

        Ok(Self {
            webhook_url,
            token,
            requests_url,
            api_base,
            api_key: None,
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            timestamp_file: PathBuf::from(DEFAULT_TIMESTAMP_FILE),
            start_from: None,
            max_length: DEFAULT_MAX_LENGTH,
            print_timeout: Duration::from_secs(DEFAULT_PRINT_TIMEOUT_SECS),
        })
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::Invalid {
                message: "check interval must be greater than zero".to_string(),
            });
        }
        self.check_interval = interval;
        Ok(self)
    }

    pub fn with_print_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "print timeout must be greater than zero".to_string(),
            });
        }
        self.print_timeout = timeout;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_timestamp_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.timestamp_file = path.into();
        self
    }

    /// Set the truncation policy; `no_truncate` wins over `max_length`.
    pub fn with_truncation(mut self, max_length: usize, no_truncate: bool) -> Self {
        self.max_length = if no_truncate { 0 } else { max_length };
        self
    }

    /// Set the operator start override from its textual form.
    pub fn with_start_from(mut self, start_from: Option<&str>) -> Result<Self, ConfigError> {
        self.start_from = match start_from {
            Some(raw) => Some(parse_start_time(raw)?),
            None => None,
        };
        Ok(self)
    }
}

/// Parse an operator-supplied start time.
///
/// Accepts every format the upstream timestamps use, but unlike upstream
/// timestamps a malformed value is an error instead of the sentinel.
pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    try_parse_timestamp(raw).ok_or_else(|| ConfigError::InvalidStartTime(raw.to_string()))
}

/// Token of a capture URL: its last path segment.
///
/// Bare tokens (no scheme) are accepted as-is. Query strings are ignored
/// and the dashboard form `https://host/#!/view/<token>` resolves too.
pub fn token_from_webhook_url(webhook_url: &str) -> Result<String, ConfigError> {
    let without_query = webhook_url.split('?').next().unwrap_or_default();
    let trimmed = without_query.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidWebhookUrl(webhook_url.to_string()));
    }

    let path = match trimmed.split_once("://") {
        // Everything after the host
        Some((_, rest)) => match rest.split_once('/') {
            Some((_, path)) => path,
            None => return Err(ConfigError::MissingToken(webhook_url.to_string())),
        },
        None => trimmed,
    };

    match path.rsplit('/').next() {
        Some(token) if !token.is_empty() && token != "#!" => Ok(token.to_string()),
        _ => Err(ConfigError::MissingToken(webhook_url.to_string())),
    }
}
