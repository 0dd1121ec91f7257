//! The fetch-cache-validate pipeline shared by every fetcher.

use std::sync::Arc;
use std::time::Duration;

use stockfeed_cache::{Cache, Fingerprint, SingleFlight};
use stockfeed_config::{Endpoints, Settings};
use stockfeed_types::{FeedError, Result, Table};
use tracing::{debug, warn};

use crate::client::{HttpTransport, Transport};
use crate::endpoint::Endpoint;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

/// Cache lookup, single-flight, rate limiting, transport, normalization and
/// cache store, in that order.
///
/// One pipeline is shared by all fetchers so they draw on the same cache
/// and request budget.
#[derive(Debug)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    cache: Cache,
    flights: SingleFlight,
    limiter: RateLimiter,
    retry: RetryPolicy,
    endpoints: Endpoints,
    timeout: Duration,
    max_concurrency: usize,
}

impl Pipeline {
    /// Builds a pipeline backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, the HTTP client cannot
    /// be built, or the cache directory cannot be created.
    pub fn new(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::new(&settings.http)?;
        Self::with_transport(settings, Arc::new(transport))
    }

    /// Builds a pipeline over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the cache directory
    /// cannot be created.
    pub fn with_transport(settings: &Settings, transport: Arc<dyn Transport>) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            transport,
            cache: Cache::from_settings(&settings.cache)?,
            flights: SingleFlight::new(),
            limiter: RateLimiter::new(settings.http.requests_per_second),
            retry: RetryPolicy::new(&settings.retry),
            endpoints: settings.endpoints.clone(),
            timeout: settings.http.timeout(),
            max_concurrency: settings.http.max_concurrency.max(1),
        })
    }

    /// Replaces the cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Returns the shared cache.
    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Upper bound on concurrent requests issued by batch fetches.
    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetches the table for validated parameters.
    ///
    /// Concurrent calls with equal parameters share one upstream request.
    /// Failures are never cached, and neither is a response left with no
    /// rows after post-processing.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Transport`](stockfeed_types::FeedError::Transport)
    /// when the request fails after retries, and
    /// [`FeedError::EmptyResult`](stockfeed_types::FeedError::EmptyResult) or
    /// [`FeedError::MalformedPayload`](stockfeed_types::FeedError::MalformedPayload)
    /// when the response holds no usable rows.
    pub async fn run<P: Endpoint>(&self, params: &P) -> Result<Table> {
        let fingerprint = Fingerprint::of(params)?;
        if let Some(table) = self.cache.lookup(&fingerprint) {
            debug!(kind = %P::KIND, %fingerprint, "cache hit");
            return Ok(table);
        }

        let _flight = self.flights.acquire(fingerprint).await;
        if let Some(table) = self.cache.lookup(&fingerprint) {
            debug!(kind = %P::KIND, %fingerprint, "cache filled by concurrent request");
            return Ok(table);
        }

        let subject = params.subject();
        debug!(kind = %P::KIND, %fingerprint, %subject, "cache miss");

        let url = self.endpoints.url(P::KIND);
        let query = params.query();
        let table = {
            let (url, query) = (url.as_str(), query.as_slice());
            let (transport, limiter, timeout) = (&self.transport, &self.limiter, self.timeout);
            let payload = self
                .retry
                .run(move || async move {
                    limiter.acquire().await;
                    transport.get(url, query, timeout).await
                })
                .await?;
            params.finish(params.schema().normalize_bytes(&payload.body, &subject)?)?
        };
        if table.is_empty() {
            debug!(kind = %P::KIND, %subject, "no rows left after post-processing");
            return Err(FeedError::EmptyResult {
                kind: P::KIND,
                subject,
            });
        }

        if let Err(e) = self.cache.store(fingerprint, &table, self.cache.ttl()) {
            warn!(kind = %P::KIND, %fingerprint, error = %e, "failed to persist cache entry");
        }
        debug!(kind = %P::KIND, %subject, rows = table.len(), "fetched");
        Ok(table)
    }
}
