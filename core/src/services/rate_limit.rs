//! Fixed-window request limiter keyed by network address

use og_shared::RateLimitConfig;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::{KeyValueStore, StoreResult};

/// Store key of the request counter for a network address
pub fn rate_limit_key(address: &str) -> String {
    format!("ratelimit:{}", address)
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Seconds until the window resets; only set when denied
    pub retry_after_seconds: Option<u64>,
}

impl RateLimitDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after_seconds: None,
        }
    }

    pub fn denied(retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            retry_after_seconds: Some(retry_after_seconds),
        }
    }
}

/// Fixed-window counter: the first request of a window sets its TTL
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request for `address` and decide whether it is admitted
    ///
    /// Store failures admit the request.
    pub async fn check(&self, address: &str) -> RateLimitDecision {
        match self.try_check(address).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    ip = %address,
                    error = %e,
                    event = "rate_limit_fail_open",
                    "Rate limiter store error, admitting request"
                );
                RateLimitDecision::allowed()
            }
        }
    }

    async fn try_check(&self, address: &str) -> StoreResult<RateLimitDecision> {
        let key = rate_limit_key(address);
        let count = self.store.incr(&key).await?;

        if count == 1 {
            self.store.expire(&key, self.config.window_seconds).await?;
        }

        if count <= i64::from(self.config.max_requests) {
            return Ok(RateLimitDecision::allowed());
        }

        let retry_after = match self.store.ttl(&key).await? {
            Some(ttl) if ttl > 0 => ttl as u64,
            _ => {
                // Counter lost its window (e.g. the EXPIRE after the first INCR failed)
                self.store.expire(&key, self.config.window_seconds).await?;
                self.config.window_seconds
            }
        };

        debug!(
            ip = %address,
            count = count,
            retry_after = retry_after,
            event = "rate_limit_exceeded",
            "Request denied by rate limiter"
        );
        Ok(RateLimitDecision::denied(retry_after))
    }
}
