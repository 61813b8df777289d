//! HTTP client module
//!
//! Provides the authenticated HTTP accessor with retry, rate limiting, and
//! backoff strategies.
//!
//! # Features
//!
//! - **Accessor Trait**: `HttpAccessor` is the seam the sync engine reads through
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Requests-per-second throttle using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff

mod accessor;
mod client;
mod rate_limit;
mod retry;

pub use accessor::{HttpAccessor, PageRequest};
pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
