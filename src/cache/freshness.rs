//! Freshness and validator extraction from response headers.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use reqwest::header::{
    CACHE_CONTROL, ETAG, EXPIRES, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};

/// `IMF-fixdate`, the RFC 1123 form used by `Expires`, `Last-Modified` and `If-Modified-Since`.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parses an HTTP date such as `Sun, 06 Nov 1994 08:49:37 GMT`.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Formats an instant as an HTTP date.
#[must_use]
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// How long a response may be served and how it can be revalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Freshness {
    /// Absolute instant after which the response is stale.
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque validator from `ETag`.
    pub etag: Option<String>,
    /// Timestamp validator from `Last-Modified`.
    pub last_modified: Option<DateTime<Utc>>,
    /// Validators exist but no TTL does: every reuse must be revalidated.
    pub revalidate: bool,
}

impl Freshness {
    /// Reads `Cache-Control`, `Expires`, `Last-Modified` and `ETag`.
    ///
    /// `max-age` / `s-maxage` win over `Expires`; a present but zero `max-age`
    /// yields no TTL and suppresses `Expires`. `Expires` only counts when it
    /// lies in the future.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Self {
        let expires_at = match max_age(headers) {
            Some(secs) => (secs > 0)
                .then(|| TimeDelta::try_seconds(i64::try_from(secs).ok()?))
                .flatten()
                .and_then(|ttl| now.checked_add_signed(ttl)),
            None => header_str(headers, EXPIRES)
                .and_then(parse_http_date)
                .filter(|at| *at > now),
        };

        let last_modified = header_str(headers, LAST_MODIFIED).and_then(parse_http_date);
        let etag = header_str(headers, ETAG)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        let revalidate = expires_at.is_none() && (last_modified.is_some() || etag.is_some());

        Self {
            expires_at,
            etag,
            last_modified,
            revalidate,
        }
    }

    /// Whether any freshness signal exists, which is what makes a response storable.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        self.expires_at.is_some() || self.has_validators()
    }

    /// Whether an `ETag` or `Last-Modified` is available for a conditional request.
    #[must_use]
    pub const fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    /// The TTL has not passed yet.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at > now)
    }

    /// Servable as-is, or usable for revalidation.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_fresh_at(now) || self.has_validators()
    }

    /// Conditional header to send when revalidating: `If-None-Match` takes
    /// precedence over `If-Modified-Since`.
    pub(crate) fn conditional_header(&self) -> Option<(HeaderName, String)> {
        if let Some(etag) = &self.etag {
            return Some((IF_NONE_MATCH, etag.clone()));
        }
        self.last_modified
            .map(|at| (IF_MODIFIED_SINCE, format_http_date(at)))
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First `max-age` or `s-maxage` directive with a numeric value.
fn max_age(headers: &HeaderMap) -> Option<u64> {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|directive| directive.split_once('='))
        .find_map(|(name, value)| {
            let name = name.trim();
            let value = value.trim().trim_matches('"');
            let is_age = name.eq_ignore_ascii_case("max-age") || name.eq_ignore_ascii_case("s-maxage");
            (is_age && !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
                .then(|| value.parse::<u64>().unwrap_or(u64::MAX))
        })
}
