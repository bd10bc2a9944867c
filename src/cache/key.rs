use reqwest::Method;
use url::form_urlencoded;

/// Cache key for `method` on `url`.
///
/// GET uses the bare [`cache_key`]; other methods are prefixed with their
/// name, so a body-less HEAD or OPTIONS entry is never served to a GET.
#[must_use]
pub fn request_key(method: &Method, url: &str) -> String {
    let key = cache_key(url);
    if *method == Method::GET {
        key
    } else {
        format!("{method} {key}")
    }
}

/// Normalizes a request URL into a cache key.
///
/// The scheme, host and path are kept exactly as given; the fragment is
/// dropped and query parameters are re-sorted by name (stable, so repeated
/// names keep their relative order). `?a=1&b=2` and `?b=2&a=1` collide.
#[must_use]
pub fn cache_key(url: &str) -> String {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    let Some((base, query)) = url.split_once('?') else {
        return url.to_owned();
    };

    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        return base.to_owned();
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{base}?{query}")
}
