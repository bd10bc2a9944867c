//! Shared state handed to every client built from the same composition root.

use crate::cache::ResponseCache;
use crate::core::RestError;
use crate::core::client::constants::{DEFAULT_CACHE_ENTRIES, DEFAULT_RETRY_BUCKET, DEFAULT_RETRY_RPM};
use crate::limiter::RateLimiter;
use crate::telemetry::{NoopTelemetry, Telemetry};
use std::sync::Arc;

/// The retry limiter, response cache and telemetry sink shared across clients.
///
/// Cloning is cheap and clones share state. Build one per process (or per
/// test) and pass it to each [`RestClientBuilder`](crate::RestClientBuilder).
#[derive(Debug, Clone)]
pub struct RestContext {
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    telemetry: Arc<dyn Telemetry>,
}

impl RestContext {
    /// Creates a context from its parts.
    #[must_use]
    pub fn new(limiter: RateLimiter, cache: ResponseCache, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            limiter: Arc::new(limiter),
            cache: Arc::new(cache),
            telemetry,
        }
    }

    /// Default cache and no-op telemetry with a retry budget of `rate_per_minute`.
    ///
    /// # Errors
    ///
    /// [`RestError::InvalidRate`] for a zero rate.
    pub fn with_retry_rate(rate_per_minute: u64) -> Result<Self, RestError> {
        Ok(Self::new(
            RateLimiter::new(rate_per_minute, DEFAULT_RETRY_BUCKET)?,
            ResponseCache::new(DEFAULT_CACHE_ENTRIES),
            Arc::new(NoopTelemetry),
        ))
    }

    /// Replaces the retry limiter.
    #[must_use]
    pub fn limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Arc::new(limiter);
        self
    }

    /// Replaces the response cache.
    #[must_use]
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    #[must_use]
    pub fn retry_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn response_cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub(crate) fn sink(&self) -> &dyn Telemetry {
        self.telemetry.as_ref()
    }

    pub(crate) fn telemetry_handle(&self) -> Arc<dyn Telemetry> {
        Arc::clone(&self.telemetry)
    }
}

impl Default for RestContext {
    fn default() -> Self {
        let limiter = RateLimiter::new(DEFAULT_RETRY_RPM, DEFAULT_RETRY_BUCKET)
            .expect("default retry rate is non-zero");
        Self::new(limiter, ResponseCache::new(DEFAULT_CACHE_ENTRIES), Arc::new(NoopTelemetry))
    }
}
