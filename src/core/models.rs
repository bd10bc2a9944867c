use crate::cache::Freshness;
use crate::core::RestError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::borrow::Cow;

/* ----- RESPONSE (result of an execution, and the cache entry) ----- */

/// A completed HTTP exchange, either fetched live or served from the cache.
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) url: String,
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) freshness: Freshness,
    pub(crate) cache_hit: bool,
}

impl Response {
    pub(crate) fn new(url: String, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            url,
            status,
            headers,
            body,
            freshness: Freshness::default(),
            cache_hit: false,
        }
    }

    /// The absolute URL that was requested (the original one, even behind a mock route).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body, already gunzipped when decompression was requested.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Freshness and validators extracted from the response headers.
    #[must_use]
    pub const fn freshness(&self) -> &Freshness {
        &self.freshness
    }

    /// Absolute expiry instant, if the response carried a TTL.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.freshness.expires_at
    }

    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.freshness.etag.as_deref()
    }

    #[must_use]
    pub const fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.freshness.last_modified
    }

    /// `true` when validators exist but no TTL does.
    #[must_use]
    pub const fn revalidate(&self) -> bool {
        self.freshness.revalidate
    }

    /// `true` when this response came from local storage rather than a live dispatch.
    #[must_use]
    pub const fn cache_hit(&self) -> bool {
        self.cache_hit
    }

    /// Within its TTL right now.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.freshness.is_fresh_at(Utc::now())
    }

    /// Stale, but an `ETag` or `Last-Modified` allows a conditional request.
    #[must_use]
    pub fn needs_revalidation(&self) -> bool {
        !self.is_fresh() && self.freshness.has_validators()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns a 4xx/5xx into [`RestError::Status`].
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Status`] when the status is a client or server error.
    pub fn error_for_status(self) -> Result<Self, RestError> {
        if self.status.is_client_error() || self.status.is_server_error() {
            return Err(RestError::Status {
                status: self.status.as_u16(),
                url: self.url,
            });
        }
        Ok(self)
    }
}
