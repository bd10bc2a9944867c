use crate::core::RestError;
use bytes::Bytes;
use flate2::read::GzDecoder;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap};
use std::io::Read;

/// `true` when `Content-Encoding` (or, lacking it, `Content-Type`) says gzip.
pub(crate) fn is_gzip(headers: &HeaderMap) -> bool {
    let value = headers
        .get(CONTENT_ENCODING)
        .or_else(|| headers.get(CONTENT_TYPE))
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim();
    value.eq_ignore_ascii_case("gzip") || value.eq_ignore_ascii_case("application/x-gzip")
}

/// Gunzips `body`. An empty body stays empty.
pub(crate) fn gunzip(body: Bytes) -> Result<Bytes, RestError> {
    if body.is_empty() {
        return Ok(body);
    }
    let mut out = Vec::with_capacity(body.len().saturating_mul(4));
    GzDecoder::new(body.as_ref())
        .read_to_end(&mut out)
        .map_err(RestError::Decompress)?;
    Ok(Bytes::from(out))
}
