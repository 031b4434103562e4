use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;

use super::client::RateLimitConfig;

/// Token bucket guarding outbound quote requests
pub struct RateLimiter {
    limiter: GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RateLimiter {
    /// Zero rates are raised to 1 request per second; a zero burst falls back
    /// to the per-second rate
    pub fn new(config: RateLimitConfig) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(per_second);

        let quota = Quota::per_second(per_second).allow_burst(burst);
        Self {
            limiter: GovernorRateLimiter::direct(quota),
        }
    }

    /// Wait until a request can be made
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a token without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
