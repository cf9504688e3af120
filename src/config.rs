//! Client configuration.
//!
//! A [`StudioConfig`] is built once at process start, usually from the
//! environment, and handed to [`StudioClient::new`](crate::client::StudioClient::new).
//!
//! # Environment Variables
//!
//! - `CREWAI_BASE_URL`: studio base URL (default: `http://172.16.16.148:8088`)
//! - `CREWAI_TIMEOUT`: per-request timeout in seconds (default: 30)
//! - `MAX_RETRIES`: consecutive failed status checks tolerated while polling (default: 3)
//! - `CREWAI_POLL_INTERVAL`: seconds between status checks (default: 2)
//! - `CREWAI_MAX_WAIT`: seconds to wait for a run (default: 300)
//! - `CREWAI_API_SCHEMA`: `runs` or `execute` (default: `runs`)

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::client::ApiSchema;

pub const DEFAULT_BASE_URL: &str = "http://172.16.16.148:8088";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_POLL_FAILURES: u32 = 3;
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 2.0;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings for talking to one studio deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_failures: u32,
    pub default_max_wait: Duration,
    pub schema: ApiSchema,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS),
            max_poll_failures: DEFAULT_MAX_POLL_FAILURES,
            default_max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            schema: ApiSchema::default(),
        }
    }
}

impl StudioConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get("CREWAI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(raw) = get("CREWAI_TIMEOUT") {
            config.request_timeout = Duration::from_secs(parse_positive("CREWAI_TIMEOUT", &raw)?);
        }
        if let Some(raw) = get("MAX_RETRIES") {
            config.max_poll_failures = raw.parse().map_err(|e: std::num::ParseIntError| {
                invalid("MAX_RETRIES", &raw, e.to_string())
            })?;
        }
        if let Some(raw) = get("CREWAI_POLL_INTERVAL") {
            config.poll_interval = parse_seconds("CREWAI_POLL_INTERVAL", &raw)?;
        }
        if let Some(raw) = get("CREWAI_MAX_WAIT") {
            config.default_max_wait = Duration::from_secs(parse_positive("CREWAI_MAX_WAIT", &raw)?);
        }
        if let Some(raw) = get("CREWAI_API_SCHEMA") {
            config.schema = raw
                .parse::<ApiSchema>()
                .map_err(|reason| invalid("CREWAI_API_SCHEMA", &raw, reason))?;
        }

        Ok(config)
    }

    pub fn with_schema(mut self, schema: ApiSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_failures(mut self, failures: u32) -> Self {
        self.max_poll_failures = failures;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid(key, raw, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(key, raw, e.to_string())),
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| invalid(key, raw, e.to_string()))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid(key, raw, "must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(key, raw, e.to_string()))
}
