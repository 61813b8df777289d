//! Retry policy and failure classification
//!
//! Throttling (429), gateway errors and transport timeouts are transient and
//! retried with backoff; every other failure ends the request immediately.

use crate::error::Error;
use crate::types::BackoffType;
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// How many times and how patiently to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Growth of the delay between attempts
    pub backoff: BackoffType,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: BackoffType::Exponential,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffType::Constant => self.initial_delay,
            BackoffType::Linear => self.initial_delay.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .initial_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }

    /// Delay before retry number `attempt`, preferring a server-requested
    /// wait; both are capped at `max_delay`
    pub fn delay_for(&self, attempt: u32, requested: Option<Duration>) -> Duration {
        requested.map_or_else(|| self.delay(attempt), |wait| wait.min(self.max_delay))
    }

    /// Whether another attempt is allowed after `attempt` failed
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// A failed attempt and whether it is worth repeating
#[derive(Debug)]
pub(crate) struct Failure {
    pub error: Error,
    pub retryable: bool,
    /// Server-requested wait, overriding the backoff delay
    pub wait: Option<Duration>,
}

impl Failure {
    /// Classify a non-success response; consumes the body for the message
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(&response);
            return Self {
                error: Error::RateLimited {
                    retry_after_seconds: wait.map_or(0, |d| d.as_secs()),
                },
                retryable: true,
                wait,
            };
        }

        let body = response.text().await.unwrap_or_default();
        Self {
            error: Error::http_status(status.as_u16(), body),
            retryable: is_transient_status(status),
            wait: None,
        }
    }

    /// Classify a transport error
    pub fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            return Self {
                error: Error::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                },
                retryable: true,
                wait: None,
            };
        }
        Self {
            retryable: error.is_connect(),
            error: Error::Http(error),
            wait: None,
        }
    }
}

/// Gateway and server errors that usually clear up on their own
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// `Retry-After` in seconds, when the server sent one
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
}
