//! Request throttling
//!
//! A direct (unkeyed) governor limiter shared by every request the client
//! makes. Requests wait for a permit; they are never rejected.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Requests-per-second throttle
#[derive(Clone)]
pub struct RateLimiter {
    requests_per_second: NonZeroU32,
    limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Allow `requests_per_second` requests, with bursts of the same size
    ///
    /// A rate of zero is treated as one request per second.
    pub fn per_second(requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            requests_per_second: rate,
            limiter: Arc::new(Governor::direct(Quota::per_second(rate))),
        }
    }

    /// Configured rate
    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second.get()
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish_non_exhaustive()
    }
}
