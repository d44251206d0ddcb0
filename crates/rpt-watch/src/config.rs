// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ConfigError;
use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::time::Duration;

pub const DEFAULT_TARGETS_FILE: &str = "targets.json";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_URL: &str = "https://api.nitrado.net";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One monitored game server and where its alerts go.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    pub service_id: u64,
    pub access_token: String,
    pub webhook_url: String,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("service_id", &self.service_id)
            .field("access_token", &"<redacted>")
            .field("webhook_url", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct TargetsFile {
    targets: Vec<Target>,
}

/// Configuration of the monitor agent
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Game servers to watch, in sweep order
    pub targets: Vec<Target>,
    /// Idle delay between two sweeps
    pub poll_interval: Duration,
    /// Upper bound of every outgoing HTTP request
    pub request_timeout: Duration,
    /// Base URL of the game server hosting API
    pub api_url: String,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            api_url: DEFAULT_API_URL.to_string(),
            https_proxy: None,
            log_level: "info".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Create configuration from environment variables and the targets file they point to
    pub fn from_env() -> Result<Self, ConfigError> {
        let targets_file =
            env::var("RPT_WATCH_TARGETS_FILE").unwrap_or_else(|_| DEFAULT_TARGETS_FILE.to_string());
        let poll_interval_secs = env::var("RPT_WATCH_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let request_timeout_secs = env::var("RPT_WATCH_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let api_url = env::var("RPT_WATCH_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let https_proxy = env::var("RPT_WATCH_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();
        let log_level = env::var("RPT_WATCH_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            targets: load_targets(&targets_file)?,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            api_url,
            https_proxy,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "no targets configured".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "poll interval must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if !is_http_url(&self.api_url) {
            return Err(ConfigError::InvalidConfig(format!(
                "API URL '{}' is not an http(s) URL",
                self.api_url
            )));
        }

        for target in &self.targets {
            if target.access_token.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "access token of service {} cannot be empty",
                    target.service_id
                )));
            }
            if !is_http_url(&target.webhook_url) {
                return Err(ConfigError::InvalidConfig(format!(
                    "webhook URL of service {} is not an http(s) URL",
                    target.service_id
                )));
            }
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

fn load_targets(path: &str) -> Result<Vec<Target>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadTargets {
        path: path.to_string(),
        source,
    })?;
    let file: TargetsFile =
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseTargets {
            path: path.to_string(),
            source,
        })?;
    Ok(file.targets)
}

fn is_http_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
