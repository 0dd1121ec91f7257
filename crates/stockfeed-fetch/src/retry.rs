//! Retry with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use stockfeed_config::RetrySettings;
use stockfeed_types::TransportError;
use tracing::warn;

/// Retry policy for transient transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// Creates a policy from retry settings.
    #[must_use]
    pub const fn new(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay_ms: settings.base_delay_ms,
            max_delay_ms: settings.max_delay_ms,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Returns the retry budget after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Calculates the delay before retry number `attempt` (1-based).
    ///
    /// `base * 2^attempt`, capped at the maximum, with a deterministic
    /// jitter of up to +/-25%.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp_delay = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(10));
        let capped = exp_delay.min(self.max_delay_ms);

        let jitter_range = capped / 4;
        let delay = if jitter_range > 0 {
            let offset = (u64::from(attempt) * 17) % (jitter_range * 2);
            (capped + offset).saturating_sub(jitter_range)
        } else {
            capped
        };
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Runs `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last error from `operation`.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        ?delay,
                        "retrying upstream request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetrySettings::default())
    }
}
