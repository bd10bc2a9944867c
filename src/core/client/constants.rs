//! Centralized constants for defaults and well-known header names.

use reqwest::header::HeaderName;
use std::time::Duration;

/// User agent sent when none is configured.
pub(crate) const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Response timeout used when none is configured and timeouts are not disabled.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Connect timeout used when none is configured and timeouts are not disabled.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);

/// `X-Retry`: the retry index, sent on every attempt after the first.
pub const RETRY_HEADER: HeaderName = HeaderName::from_static("x-retry");

/// `X-Original-URL`: the original absolute URL when requests are routed to a mock server.
pub const ORIGINAL_URL_HEADER: HeaderName = HeaderName::from_static("x-original-url");

/// Retry budget shared by all clients of a default context, in requests per minute.
pub(crate) const DEFAULT_RETRY_RPM: u64 = 6000;

/// Bucket width of the default retry limiter.
pub(crate) const DEFAULT_RETRY_BUCKET: Duration = Duration::from_secs(1);

/// Entry bound of the default response cache.
pub(crate) const DEFAULT_CACHE_ENTRIES: usize = 10_000;
