//! Tap configuration
//!
//! The tap is configured with a JSON document (Singer convention) holding the
//! API credentials, account coordinates and the initial `start_date`.

use crate::error::{Error, Result};
use crate::template::{self, TemplateContext};
use crate::types::{parse_datetime, OptionStringExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Base URL used when the config does not override it
pub const DEFAULT_BASE_URL: &str =
    "https://{{ config.server_subdomain }}.saasoptics.com/{{ config.account_name }}/api/v1.0";

/// Default width of a date window
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Records per page reported by the API (not negotiable in v1.0)
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for a tap run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// API token sent as `Authorization: Token <api_token>`
    pub api_token: String,

    /// Account name segment of the API URL
    pub account_name: String,

    /// Server subdomain (e.g. `ws`, `ws2`)
    pub server_subdomain: String,

    /// Initial watermark for datetime streams without a bookmark
    pub start_date: String,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Base URL override (may contain `{{ config.* }}` templates)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Width of a date window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Records per page, used for progress reporting
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Maximum retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Client-side request rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    5
}

impl TapConfig {
    /// Load the config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse the config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;

        for field in ["api_token", "account_name", "server_subdomain", "start_date"] {
            if raw.get(field).and_then(serde_json::Value::as_str).is_none() {
                return Err(Error::missing_field(field));
            }
        }

        let config: TapConfig = serde_json::from_value(raw)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::invalid_value("api_token", "must not be empty"));
        }
        parse_datetime(&self.start_date)
            .map_err(|e| Error::invalid_value("start_date", e.to_string()))?;
        if self.window_days == 0 {
            return Err(Error::invalid_value("window_days", "must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be at least 1",
            ));
        }
        self.base_url()?;
        Ok(())
    }

    /// Initial watermark for datetime streams
    pub fn start_date(&self) -> Result<DateTime<Utc>> {
        parse_datetime(&self.start_date)
    }

    /// Resolve the API base URL
    pub fn base_url(&self) -> Result<String> {
        let template = self
            .base_url
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let ctx = TemplateContext::with_config(serde_json::to_value(self)?);
        let rendered = template::render(&template, &ctx)?;
        url::Url::parse(&rendered)?;
        Ok(rendered.trim_end_matches('/').to_string())
    }

    /// User agent for requests
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| format!("saasoptics-tap/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
