//! One execution: cache lookup, attempt loop with retry gating, cache commit.

use super::RestClient;
use super::body::{ContentType, RequestBody};
use super::constants::{ORIGINAL_URL_HEADER, RETRY_HEADER};
use super::decompress::{gunzip, is_gzip};
use super::retry::AttemptOutcome;
use crate::cache::{Freshness, is_read_method, request_key};
use crate::core::{Response, RestError};
use crate::telemetry::Tags;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{
    ACCEPT, CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue, IF_MODIFIED_SINCE,
    IF_NONE_MATCH,
};
use reqwest::{Method, StatusCode};
use std::time::Instant;
use url::Url;

/// What came back from one attempt, body already read.
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

/// Everything an attempt needs that does not change between retries.
struct Dispatch<'a> {
    method: &'a Method,
    target: Url,
    original: &'a str,
    payload: Option<Bytes>,
    revalidating: Option<&'a Response>,
}

fn is_content_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

impl RestClient {
    /// Executes `method {base_url}{path}` with `body`.
    ///
    /// Cacheable reads are served from the cache while fresh, and revalidated
    /// with `If-None-Match` / `If-Modified-Since` once stale; a `304` returns
    /// the stored response. Transport errors and 5xx are retried per the
    /// configured [`RetryStrategy`](crate::RetryStrategy) as long as the
    /// context's retry limiter admits each retry.
    ///
    /// Non-5xx statuses, and 5xx once retries stop, are returned as `Ok`.
    ///
    /// # Errors
    ///
    /// - Construction errors ([`RestError::Url`], [`RestError::BodyMismatch`],
    ///   [`RestError::Encode`], [`RestError::Config`]) before anything is sent.
    /// - [`RestError::Http`] when the last attempt failed at the transport level.
    /// - [`RestError::Decompress`] when a gzip body could not be decoded.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, body), err, fields(method = %method, path = %path))
    )]
    pub async fn execute(&self, method: Method, path: &str, body: RequestBody) -> Result<Response, RestError> {
        let url = format!("{}{}", self.base_url, path);
        let target = self.dispatch_url(&url)?;
        let key = request_key(&method, &url);
        let cacheable = self.enable_cache && is_read_method(&method);

        let revalidating = if cacheable {
            match self.context.response_cache().get(&key) {
                Some(hit) if hit.is_fresh() => return Ok(hit),
                Some(hit) if hit.needs_revalidation() => Some(hit),
                _ => None,
            }
        } else {
            None
        };

        let payload = body.encode(self.content_type)?;

        let dispatch = Dispatch {
            method: &method,
            target,
            original: &url,
            payload,
            revalidating: revalidating.as_ref(),
        };
        let raw = self.send_with_retry(&dispatch).await?;

        if raw.status == StatusCode::NOT_MODIFIED
            && let Some(hit) = revalidating
        {
            #[cfg(feature = "tracing")]
            tracing::trace!(url = %url, "revalidated, serving cached body");
            return Ok(hit);
        }

        let body = if self.uncompress_response && is_gzip(&raw.headers) {
            gunzip(raw.body)?
        } else {
            raw.body
        };

        let mut response = Response::new(url, raw.status, raw.headers, body);
        response.freshness = Freshness::from_headers(&response.headers, Utc::now());

        if cacheable && response.is_success() {
            self.context.response_cache().insert_if_absent(key, &response);
        }

        Ok(response)
    }

    /// Applies the mock route, if any, to the absolute request URL.
    fn dispatch_url(&self, url: &str) -> Result<Url, RestError> {
        let mut target = Url::parse(url)?;
        if let Some(mock) = &self.mockup {
            let routed = target.set_scheme(mock.scheme()).is_ok()
                && target.set_host(mock.host_str()).is_ok()
                && target.set_port(mock.port()).is_ok();
            if !routed {
                return Err(RestError::Config(format!("cannot route {url} to mock server {mock}")));
            }
        }
        Ok(target)
    }

    async fn send_with_retry(&self, dispatch: &Dispatch<'_>) -> Result<RawResponse, RestError> {
        let mut attempt: u32 = 0;
        loop {
            let request = self.build_attempt(dispatch, attempt).await;

            if !self.metrics.disable_connection_metrics {
                self.record("conn_request", 1.0, self.tags());
            }

            let started = Instant::now();
            let result = Self::send_once(request).await;
            let outcome = match &result {
                Ok(raw) => AttemptOutcome::Status(raw.status),
                Err(_) => AttemptOutcome::TransportError,
            };

            if !self.metrics.disable_api_call_metrics {
                let status = match outcome {
                    AttemptOutcome::Status(status) => status.as_u16().to_string(),
                    AttemptOutcome::TransportError => "error".to_owned(),
                };
                let tags = self
                    .tags()
                    .add("status", status)
                    .add("retry", (attempt > 0).to_string());
                self.record("api_call.time", started.elapsed().as_secs_f64() * 1000.0, tags);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %dispatch.method,
                url = %dispatch.original,
                attempt,
                outcome = ?outcome,
                "attempt finished"
            );

            let Some(strategy) = &self.retry_strategy else {
                return result.map_err(RestError::from);
            };
            let decision = strategy.should_retry(dispatch.method, outcome, attempt);
            if !decision.retry {
                return result.map_err(RestError::from);
            }

            if self.context.retry_limiter().admit(1).is_err() {
                if !self.metrics.disable_api_call_metrics {
                    self.record("api_call.retry_break", 1.0, self.tags());
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(url = %dispatch.original, attempt, "retry limiter over quota, giving up");
                return result.map_err(RestError::from);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(delay_ms = decision.delay.as_millis() as u64, "retrying");

            tokio::time::sleep(decision.delay).await;
            attempt += 1;
        }
    }

    async fn send_once(request: reqwest::RequestBuilder) -> Result<RawResponse, reqwest::Error> {
        let resp = request.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    async fn build_attempt(&self, dispatch: &Dispatch<'_>, attempt: u32) -> reqwest::RequestBuilder {
        let mut headers = self.headers.read().await.clone();
        if !self.enable_cache {
            headers.remove(IF_NONE_MATCH);
            headers.remove(IF_MODIFIED_SINCE);
        }

        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        if let Some(mime) = self.content_type.mime() {
            if self.content_type == ContentType::Json {
                headers.insert(ACCEPT, HeaderValue::from_static(mime));
            }
            if is_content_method(dispatch.method) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime));
            }
        }

        if self.mockup.is_some()
            && let Ok(value) = HeaderValue::from_str(dispatch.original)
        {
            headers.insert(ORIGINAL_URL_HEADER, value);
        }

        if let Some((name, value)) = dispatch
            .revalidating
            .and_then(|hit| hit.freshness.conditional_header())
            && let Ok(value) = HeaderValue::from_str(&value)
        {
            headers.insert(name, value);
        }

        if attempt > 0 {
            headers.insert(RETRY_HEADER, HeaderValue::from(attempt));
        }

        let mut request = self
            .http
            .request(dispatch.method.clone(), dispatch.target.clone())
            .headers(headers);
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, auth.password.as_ref());
        }
        if let Some(payload) = &dispatch.payload {
            request = request.body(payload.clone());
        }
        request
    }

    fn tags(&self) -> Tags {
        Tags::new().add("target_id", self.metrics.target_id.as_str())
    }

    fn record(&self, metric: &str, value: f64, tags: Tags) {
        self.context.sink().record(metric, value, &tags);
    }
}
