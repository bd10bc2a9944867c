//! Request body encoding per configured content type.

use crate::core::RestError;
use bytes::Bytes;
use serde::Serialize;

/// Encoding used for request bodies and advertised in `Accept`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`.
    Form,
    /// Raw bytes, sent untouched and without a `Content-Type`.
    Bytes,
}

impl ContentType {
    pub(crate) const fn mime(self) -> Option<&'static str> {
        match self {
            Self::Json => Some("application/json"),
            Self::Form => Some("application/x-www-form-urlencoded"),
            Self::Bytes => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Form => "form",
            Self::Bytes => "bytes",
        }
    }
}

/// Payload of a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    /// Pre-encoded bytes, accepted by every content type.
    Bytes(Bytes),
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// [`RestError::Encode`] when `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, RestError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| RestError::Encode(e.to_string()))
    }

    /// Builds a form body from name/value pairs.
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Json(_) => "json",
            Self::Form(_) => "form",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Encodes the body for `content_type`. `None` means no body at all.
    pub(crate) fn encode(&self, content_type: ContentType) -> Result<Option<Bytes>, RestError> {
        match (content_type, self) {
            (_, Self::Empty) => Ok(None),
            (_, Self::Bytes(raw)) => Ok(Some(raw.clone())),
            (ContentType::Json, Self::Json(value)) => serde_json::to_vec(value)
                .map(|v| Some(Bytes::from(v)))
                .map_err(|e| RestError::Encode(e.to_string())),
            (ContentType::Form, Self::Form(pairs)) => serde_urlencoded::to_string(pairs)
                .map(|s| Some(Bytes::from(s)))
                .map_err(|e| RestError::Encode(e.to_string())),
            (expected, found) => Err(RestError::BodyMismatch {
                expected: expected.name(),
                found: found.kind(),
            }),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(raw: Bytes) -> Self {
        Self::Bytes(raw)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(raw: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(raw))
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}
