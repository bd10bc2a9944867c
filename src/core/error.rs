use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum RestError {
    /// A transport-level failure: DNS, connect, timeout, or reading the body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The base URL and path did not form a valid absolute URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Retry policy parameters were rejected at construction time.
    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// The request body is not compatible with the configured content type.
    #[error("body mismatch: content type {expected} cannot carry a {found} body")]
    BodyMismatch {
        /// The configured content type.
        expected: &'static str,
        /// The kind of body that was supplied.
        found: &'static str,
    },

    /// A structured request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// The response bytes arrived but could not be gunzipped.
    #[error("failed to decompress response body: {0}")]
    Decompress(#[source] std::io::Error),

    /// The limiter was asked to admit a zero weight.
    #[error("weight must be positive")]
    InvalidWeight,

    /// The limiter had fewer tokens than the requested weight.
    #[error("over quota")]
    OverQuota,

    /// The limiter was configured with a zero requests-per-minute rate.
    #[error("rate must be at least one request per minute")]
    InvalidRate,

    /// The server returned an unsuccessful status and the caller asked for it as an error.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// A builder option could not be applied.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RestError {
    /// Returns `true` for errors raised before any byte went on the wire.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::Url(_)
                | Self::InvalidRetryPolicy(_)
                | Self::BodyMismatch { .. }
                | Self::Encode(_)
                | Self::Config(_)
        )
    }
}
