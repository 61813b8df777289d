//! Authenticated HTTP client for the SaaSOptics API
//!
//! Every request carries the `Authorization: Token` header and the user
//! agent, waits on the optional rate limiter, and is retried according to
//! the client's `RetryPolicy`.

use super::rate_limit::RateLimiter;
use super::retry::{Failure, RetryPolicy};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Timeout of a single attempt
    pub timeout: Duration,
    /// Retry behaviour for transient failures
    pub retry: RetryPolicy,
    /// Requests per second, when throttled
    pub rate_limit: Option<u32>,
    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            rate_limit: None,
            default_headers: BTreeMap::new(),
            user_agent: format!("saasoptics-tap/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Client configuration for a tap config
    pub fn from_tap_config(config: &TapConfig) -> Self {
        let mut builder = Self::builder()
            .timeout(config.request_timeout())
            .max_retries(config.max_retries)
            .token(&config.api_token)
            .user_agent(config.user_agent());
        if let Some(rps) = config.requests_per_second {
            builder = builder.rate_limit(rps);
        }
        builder.build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the per-attempt timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set the backoff between retries
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.retry.backoff = backoff;
        self.config.retry.initial_delay = initial;
        self.config.retry.max_delay = max;
        self
    }

    /// Throttle to `requests_per_second`
    #[must_use]
    pub fn rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.rate_limit = Some(requests_per_second);
        self
    }

    /// Disable throttling
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Authenticate with `Authorization: Token <token>`
    #[must_use]
    pub fn token(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), format!("Token {token}"))
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(header_map(&config.default_headers)?)
            .build()?;

        let rate_limiter = config.rate_limit.map(RateLimiter::per_second);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Create the client for a tap config
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from_tap_config(config))
    }

    /// Retry policy in effect
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Rate limiter in effect, if any
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// GET `url` with extra query pairs appended in order
    ///
    /// Returns the first 2xx response. Transient failures are retried until
    /// the policy gives up, at which point the last failure is returned.
    pub async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<Response> {
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            let failure = match self.client.get(url).query(query).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(url, status = response.status().as_u16(), attempt, "Request succeeded");
                    return Ok(response);
                }
                Ok(response) => Failure::from_response(response).await,
                Err(e) => Failure::from_transport(e, self.config.timeout),
            };

            if !failure.retryable || !policy.allows_retry(attempt) {
                return Err(failure.error);
            }

            let delay = policy.delay_for(attempt, failure.wait);
            warn!(
                url,
                attempt = attempt + 1,
                max_attempts = policy.max_retries + 1,
                ?delay,
                error = %failure.error,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.config.timeout)
            .field("retry", &self.config.retry)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Default headers; the authorization value is marked sensitive
fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::config(format!("Invalid header name '{key}': {e}")))?;
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| Error::config(format!("Invalid value for header '{key}': {e}")))?;
        if name == AUTHORIZATION {
            value.set_sensitive(true);
        }
        map.insert(name, value);
    }
    Ok(map)
}
