//! Rate limiting via the governor crate (GCRA).
//!
//! Applied by the gateway to the like-toggle route; limits are
//! per-process.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

type KeyedRateLimiter =
    GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after: Duration,
}

/// Per-key in-memory rate limiter.
pub struct InMemoryRateLimiter {
    limiter: Arc<KeyedRateLimiter>,
    window: Duration,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let quota = Quota::with_period(config.window / config.max_requests)
            .expect("window must be non-zero")
            .allow_burst(NonZeroU32::new(config.max_requests).expect("max_requests must be non-zero"));

        Self {
            limiter: Arc::new(GovernorRateLimiter::keyed(quota)),
            window: config.window,
        }
    }

    pub fn from_env() -> Self {
        let config = RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            window: Duration::from_secs(
                std::env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        };
        Self::new(config)
    }

    /// Check and consume one unit of quota for `key`.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => RateLimitDecision {
                allowed: true,
                retry_after: Duration::ZERO,
            },
            Err(not_until) => RateLimitDecision {
                allowed: false,
                retry_after: not_until.wait_time_from(governor::clock::Clock::now(
                    &DefaultClock::default(),
                )),
            },
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_quota_per_key() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        });

        assert!(limiter.check("alice").allowed);
        assert!(limiter.check("alice").allowed);

        let third = limiter.check("alice");
        assert!(!third.allowed);
        assert!(third.retry_after > Duration::ZERO);

        // separate keys have separate budgets
        assert!(limiter.check("bob").allowed);
    }
}
