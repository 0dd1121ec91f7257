//! Token bucket rate limiter for upstream requests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
struct TokenBucket {
    /// Available tokens; negative while callers hold reservations.
    tokens: f64,
    last_update: Instant,
    /// Tokens added per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(requests_per_second: u32) -> Self {
        let rate = f64::from(requests_per_second);
        Self {
            tokens: rate,
            last_update: Instant::now(),
            rate,
            capacity: rate,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Takes one token, returning how long the caller must wait before using it.
    fn reserve(&mut self) -> Duration {
        self.refill(Instant::now());
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.rate)
        }
    }
}

/// Shared request budget; burst capacity equals the per-second rate.
///
/// Waiting callers are served in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Option<Mutex<TokenBucket>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second`; 0 disables it.
    #[must_use]
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            bucket: (requests_per_second > 0)
                .then(|| Mutex::new(TokenBucket::new(requests_per_second))),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self { bucket: None }
    }

    /// Returns true if requests are being limited.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.bucket.is_some()
    }

    fn lock(bucket: &Mutex<TokenBucket>) -> MutexGuard<'_, TokenBucket> {
        bucket.lock().unwrap_or_else(|poisoned| {
            warn!("rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Waits until one request may be sent.
    pub async fn acquire(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };
        let wait = Self::lock(bucket).reserve();
        if !wait.is_zero() {
            debug!(?wait, "rate limited");
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5)
    }
}
