//! Per-(route, token) sliding-window rate limiting and the SSE
//! connection cap.
//!
//! Grounded on `governor`-crate usage in the sibling example
//! `SaintPepsi-spiral-core/src/rate_limit.rs`, generalized from that
//! file's unkeyed, fixed-quota limiter to a keyed limiter (one bucket per
//! `(route, token)` pair) per spec.md §4.8.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter as Governor};
use tokio::sync::Semaphore;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::RateLimitConfig;

/// Sliding-window limiter keyed by `"{route}:{token}"`.
pub struct RateLimiter {
    inner: Governor<String, DefaultKeyedStateStore<String>, DefaultClock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.requests_per_minute.max(1)).expect("max(1) is nonzero");
        let quota = Quota::per_minute(per_minute);
        Self {
            inner: Governor::keyed(quota),
        }
    }

    /// Checks and consumes one slot for `(route, token)`. Returns
    /// `RATE_LIMITED` on overflow.
    pub fn check(&self, route: &str, token: &str) -> HubResult<()> {
        let key = format!("{route}:{token}");
        self.inner.check_key(&key).map_err(|_| HubError::RateLimited)
    }
}

/// Counting semaphore bounding concurrent SSE connections
/// (spec.md §4.8: "default 5 for tests, higher in prod").
pub struct SseGuard {
    semaphore: Arc<Semaphore>,
}

pub struct SseLease(tokio::sync::OwnedSemaphorePermit);

impl SseGuard {
    pub fn new(max_connections: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_connections)),
        }
    }

    pub fn try_acquire(&self) -> HubResult<SseLease> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .map(SseLease)
            .map_err(|_| HubError::SseConnLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_quota_succeeds() {
        let config = RateLimitConfig {
            requests_per_minute: 10,
        };
        let limiter = RateLimiter::new(&config);
        assert!(limiter.check("/api/task/create", "tok1").is_ok());
    }

    #[test]
    fn overflow_is_rate_limited() {
        let config = RateLimitConfig {
            requests_per_minute: 1,
        };
        let limiter = RateLimiter::new(&config);
        assert!(limiter.check("/api/task/create", "tok1").is_ok());
        let err = limiter.check("/api/task/create", "tok1").unwrap_err();
        assert_eq!(err.reason_code(), "RATE_LIMITED");
    }

    #[test]
    fn distinct_keys_have_independent_buckets() {
        let config = RateLimitConfig {
            requests_per_minute: 1,
        };
        let limiter = RateLimiter::new(&config);
        assert!(limiter.check("/api/task/create", "tok1").is_ok());
        assert!(limiter.check("/api/task/create", "tok2").is_ok());
    }

    #[test]
    fn sse_guard_rejects_past_cap() {
        let guard = SseGuard::new(1);
        let _first = guard.try_acquire().unwrap();
        let err = guard.try_acquire().unwrap_err();
        assert_eq!(err.reason_code(), "SSE_CONN_LIMIT");
    }
}
