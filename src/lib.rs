//! restwell: a resilient HTTP client.
//!
//! Requests go through a [`RestClient`] that retries transport errors and 5xx
//! per a [`RetryStrategy`], throttles those retries with a shared lock-free
//! [`RateLimiter`], and serves cacheable reads from a [`ResponseCache`] that
//! honours `Cache-Control`/`Expires` and revalidates with `ETag` or
//! `Last-Modified`.
//!
//! ```no_run
//! use restwell::{RestClient, RetryStrategy};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> restwell::Result<()> {
//! let client = RestClient::builder()
//!     .base_url("https://api.example.com")
//!     .enable_cache(true)
//!     .retry_strategy(RetryStrategy::exponential_backoff(
//!         Duration::from_millis(100),
//!         Duration::from_secs(2),
//!     )?)
//!     .build()?;
//!
//! let resp = client.get("/status").await?.error_for_status()?;
//! println!("{}", resp.text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `tracing`: spans around each execution and events per attempt.
//! - `metrics`: [`MetricsTelemetry`], forwarding samples to the `metrics` facade.

pub mod cache;
pub mod core;
pub mod limiter;
pub mod telemetry;

pub use crate::cache::{Freshness, ResponseCache, cache_key, request_key};
pub use crate::core::client::{
    AttemptOutcome, ContentType, CustomPool, MetricsConfig, RequestBody, RetryDecision,
    RetryStrategy,
};
pub use crate::core::{RestClient, RestClientBuilder, RestContext, RestError, Response};
pub use crate::limiter::RateLimiter;
#[cfg(feature = "metrics")]
pub use crate::telemetry::MetricsTelemetry;
pub use crate::telemetry::{NoopTelemetry, Tags, Telemetry};

/// Shorthand for results carrying a [`RestError`].
pub type Result<T> = std::result::Result<T, RestError>;
