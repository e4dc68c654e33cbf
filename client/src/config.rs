//! Configuration management for the study log client.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The endpoint and access key are optional here; whether they make the
//! remote store usable is decided by [`crate::readiness::initialize`].

use crate::error::ConfigError;
use crate::form::DEFAULT_TIME;
use crate::notification::DEFAULT_NOTIFICATION_DELAY;
use reqwest::Url;
use std::env;
use std::time::Duration;

/// Endpoint URL variable
pub const ENDPOINT_VAR: &str = "STUDYLOG_URL";
/// Access key variable
pub const ACCESS_KEY_VAR: &str = "STUDYLOG_ACCESS_KEY";
/// Table name variable
pub const TABLE_VAR: &str = "STUDYLOG_TABLE";
/// Request timeout variable (seconds)
pub const REQUEST_TIMEOUT_VAR: &str = "STUDYLOG_REQUEST_TIMEOUT_SECS";
/// Notification auto-clear delay variable (milliseconds)
pub const NOTIFICATION_MS_VAR: &str = "STUDYLOG_NOTIFICATION_MS";
/// Default form time variable
pub const DEFAULT_TIME_VAR: &str = "STUDYLOG_DEFAULT_TIME";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Remote store endpoint URL, as given
    pub endpoint: Option<String>,
    /// Remote store access key, as given
    pub access_key: Option<String>,
    /// Table holding study records (default: `study_record`)
    pub table: String,
    /// Per-request timeout (default: 10s)
    pub request_timeout: Duration,
    /// Auto-clear delay for success and validation notifications (default: 3s)
    pub notification_delay: Duration,
    /// Time text the form starts with and resets to (default: `0.5`)
    pub default_time: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key: None,
            table: studylog_rest::client::DEFAULT_TABLE.to_string(),
            request_timeout: studylog_rest::client::DEFAULT_TIMEOUT,
            notification_delay: DEFAULT_NOTIFICATION_DELAY,
            default_time: DEFAULT_TIME.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidNumber`] if a numeric variable is set but
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidNumber`] if a numeric variable is set but
    /// does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let request_timeout = parse_number(&lookup, REQUEST_TIMEOUT_VAR)?
            .map_or(defaults.request_timeout, Duration::from_secs);
        let notification_delay = parse_number(&lookup, NOTIFICATION_MS_VAR)?
            .map_or(defaults.notification_delay, Duration::from_millis);

        Ok(Self {
            endpoint: lookup(ENDPOINT_VAR),
            access_key: lookup(ACCESS_KEY_VAR),
            table: lookup(TABLE_VAR)
                .filter(|table| !table.trim().is_empty())
                .unwrap_or(defaults.table),
            request_timeout,
            notification_delay,
            default_time: lookup(DEFAULT_TIME_VAR).unwrap_or(defaults.default_time),
        })
    }

    /// Set the endpoint URL
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the access key
    #[must_use]
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Set the notification auto-clear delay
    #[must_use]
    pub const fn with_notification_delay(mut self, delay: Duration) -> Self {
        self.notification_delay = delay;
        self
    }

    /// The endpoint as an http(s) URL.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingEndpoint`]: unset, empty, or a placeholder
    /// - [`ConfigError::InvalidEndpoint`]: not an absolute http(s) URL
    pub fn validated_endpoint(&self) -> Result<Url, ConfigError> {
        let value = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|value| !is_placeholder(value))
            .ok_or(ConfigError::MissingEndpoint)?;

        let invalid = || ConfigError::InvalidEndpoint {
            value: value.to_string(),
        };
        let url = Url::parse(value).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid());
        }
        Ok(url)
    }

    /// The access key, trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAccessKey`] if it is unset, empty, or a
    /// placeholder.
    pub fn validated_access_key(&self) -> Result<&str, ConfigError> {
        self.access_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !is_placeholder(value))
            .ok_or(ConfigError::MissingAccessKey)
    }
}

fn parse_number<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { name, value })
        })
        .transpose()
}

/// Sentinel values left behind by unfilled templates
///
/// Empty text, `undefined`/`null`, `your-...` style values and
/// `<angle-bracketed>` hints.
fn is_placeholder(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    lowered.is_empty()
        || matches!(lowered.as_str(), "undefined" | "null" | "none" | "changeme")
        || lowered.contains("your-")
        || lowered.contains("your_")
        || (lowered.starts_with('<') && lowered.ends_with('>'))
}
