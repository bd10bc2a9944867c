//! Public client surface + builder.
//! Internals are split into `execute` (cache lookup, attempt loop, cache commit),
//! `body` (request encoding), `decompress` (gzip) and `constants` (defaults).

mod body;
mod connect;
pub(crate) mod constants;
mod decompress;
mod execute;
pub(crate) mod retry;

pub use body::{ContentType, RequestBody};
pub use constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, ORIGINAL_URL_HEADER, RETRY_HEADER};
pub use retry::{AttemptOutcome, RetryDecision, RetryStrategy};

use crate::core::{Response, RestContext, RestError};
use crate::telemetry::Tags;
use connect::ConnectTelemetryLayer;
use constants::USER_AGENT;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// Connection-pool settings, fixed when the client is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomPool {
    /// Idle connections kept per host. `None` keeps the transport default.
    pub max_idle_per_host: Option<usize>,
    /// Proxy for all schemes, e.g. `http://proxy.local:3128`.
    pub proxy: Option<String>,
}

/// Telemetry switches and the tag identifying this target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Value of the `target_id` tag on every sample.
    pub target_id: String,
    /// Skip the per-attempt `api_call.*` samples.
    pub disable_api_call_metrics: bool,
    /// Skip the `conn_request` samples.
    pub disable_connection_metrics: bool,
}

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: Option<String>,
}

/// Executes requests against one target with retries, retry throttling and caching.
///
/// Everything except the custom header map is fixed at build time; clones
/// share the transport pool, the header map and the [`RestContext`].
///
/// # Example
///
/// ```no_run
/// # use restwell::{RestClient, RetryStrategy};
/// # use std::time::Duration;
/// # #[tokio::main]
/// # async fn main() -> Result<(), restwell::RestError> {
/// let client = RestClient::builder()
///     .base_url("https://api.example.com")
///     .enable_cache(true)
///     .retry_strategy(RetryStrategy::simple(3, Duration::from_millis(100)))
///     .build()?;
///
/// let resp = client.get("/items/42").await?;
/// println!("{} (cached: {})", resp.status(), resp.cache_hit());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    content_type: ContentType,
    enable_cache: bool,
    uncompress_response: bool,
    retry_strategy: Option<RetryStrategy>,
    basic_auth: Option<BasicAuth>,
    metrics: MetricsConfig,
    mockup: Option<Url>,
    headers: Arc<RwLock<HeaderMap>>,
    context: RestContext,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("content_type", &self.content_type)
            .field("enable_cache", &self.enable_cache)
            .field("retry_strategy", &self.retry_strategy)
            .field("basic_auth", &self.basic_auth.as_ref().map(|_| "<redacted>"))
            .field("metrics", &self.metrics)
            .field("mockup", &self.mockup)
            .finish_non_exhaustive()
    }
}

impl Default for RestClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl RestClient {
    /// Create a new builder.
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn cache_enabled(&self) -> bool {
        self.enable_cache
    }

    /// The shared limiter, cache and telemetry this client uses.
    #[must_use]
    pub const fn context(&self) -> &RestContext {
        &self.context
    }

    /// Sets a header sent with every subsequent request, replacing any previous value.
    pub async fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.headers.write().await.insert(name, value);
    }

    /// Stops sending a previously set header.
    pub async fn remove_header(&self, name: &HeaderName) {
        self.headers.write().await.remove(name);
    }

    /* -------- verb shortcuts -------- */

    /// `GET {base_url}{path}`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn get(&self, path: &str) -> Result<Response, RestError> {
        self.execute(Method::GET, path, RequestBody::Empty).await
    }

    /// `HEAD {base_url}{path}`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn head(&self, path: &str) -> Result<Response, RestError> {
        self.execute(Method::HEAD, path, RequestBody::Empty).await
    }

    /// `OPTIONS {base_url}{path}`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn options(&self, path: &str) -> Result<Response, RestError> {
        self.execute(Method::OPTIONS, path, RequestBody::Empty).await
    }

    /// `DELETE {base_url}{path}`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<Response, RestError> {
        self.execute(Method::DELETE, path, RequestBody::Empty).await
    }

    /// `POST {base_url}{path}` with `body`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn post(&self, path: &str, body: impl Into<RequestBody>) -> Result<Response, RestError> {
        self.execute(Method::POST, path, body.into()).await
    }

    /// `PUT {base_url}{path}` with `body`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn put(&self, path: &str, body: impl Into<RequestBody>) -> Result<Response, RestError> {
        self.execute(Method::PUT, path, body.into()).await
    }

    /// `PATCH {base_url}{path}` with `body`.
    ///
    /// # Errors
    ///
    /// See [`RestClient::execute`].
    pub async fn patch(&self, path: &str, body: impl Into<RequestBody>) -> Result<Response, RestError> {
        self.execute(Method::PATCH, path, body.into()).await
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct RestClientBuilder {
    base_url: Option<String>,
    user_agent: Option<String>,
    content_type: ContentType,

    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    disable_timeout: bool,

    enable_cache: bool,
    follow_redirects: Option<bool>,
    uncompress_response: bool,

    pool: CustomPool,
    retry_strategy: Option<RetryStrategy>,
    retry_methods: Vec<Method>,

    basic_auth: Option<BasicAuth>,
    headers: Vec<(String, String)>,
    metrics: MetricsConfig,
    context: Option<RestContext>,
    mockup: Option<Url>,
}

impl RestClientBuilder {
    /// Prefix joined verbatim with every request path.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Encoding of request bodies. Default: JSON.
    pub const fn content_type(mut self, ct: ContentType) -> Self {
        self.content_type = ct;
        self
    }

    /// Response timeout. Default: [`DEFAULT_TIMEOUT`].
    pub const fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Connect timeout. Default: [`DEFAULT_CONNECT_TIMEOUT`].
    pub const fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Turn off both timeouts.
    pub const fn disable_timeout(mut self, disable: bool) -> Self {
        self.disable_timeout = disable;
        self
    }

    /// Serve and store GET/HEAD/OPTIONS responses through the context's cache.
    /// If not set, caching is disabled.
    pub const fn enable_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Follow redirects (default) or hand 3xx responses back untouched.
    pub const fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Gunzip bodies served with `Content-Encoding: gzip` (or a gzip content type).
    pub const fn uncompress_response(mut self, uncompress: bool) -> Self {
        self.uncompress_response = uncompress;
        self
    }

    /// Connection-pool size and proxy.
    pub fn pool(mut self, pool: CustomPool) -> Self {
        self.pool = pool;
        self
    }

    /// Strategy consulted after each failed attempt. Without one, nothing is retried.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Replaces the strategy's allow-list of retried methods.
    pub fn retry_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.retry_methods = methods.into_iter().collect();
        self
    }

    /// Send HTTP basic credentials with every request.
    pub fn basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password,
        });
        self
    }

    /// Adds a header sent with every request. Validated in [`build`](Self::build).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Telemetry tag and switches.
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Shared limiter, cache and telemetry. Default: a fresh [`RestContext`].
    pub fn context(mut self, context: RestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Route every request to a mock server: scheme, host and port are
    /// replaced and the original URL travels in `X-Original-URL`.
    pub fn mockup_server(mut self, url: Url) -> Self {
        self.mockup = Some(url);
        self
    }

    /// Builds the client and its connection pool.
    ///
    /// # Errors
    ///
    /// [`RestError::Config`] for an unusable header or proxy, and
    /// [`RestError::Http`] if the transport cannot be initialised.
    pub fn build(self) -> Result<RestClient, RestError> {
        let mut httpb = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));

        if !self.disable_timeout {
            let connect = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
            let response = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
            httpb = httpb.connect_timeout(connect).timeout(connect + response);
        }
        if let Some(n) = self.pool.max_idle_per_host {
            httpb = httpb.pool_max_idle_per_host(n);
        }
        if let Some(proxy) = &self.pool.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| RestError::Config(format!("invalid proxy `{proxy}`: {e}")))?;
            httpb = httpb.proxy(proxy);
        }
        if !self.follow_redirects.unwrap_or(true) {
            httpb = httpb.redirect(reqwest::redirect::Policy::none());
        }

        let context = self.context.unwrap_or_default();
        if !self.metrics.disable_connection_metrics {
            let tags = Tags::new().add("target_id", self.metrics.target_id.as_str());
            httpb = httpb.connector_layer(ConnectTelemetryLayer::new(context.telemetry_handle(), tags));
        }

        let http = httpb.build()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RestError::Config(format!("invalid header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RestError::Config(format!("invalid value for header `{name}`: {e}")))?;
            headers.append(name, value);
        }

        let retry_strategy = self
            .retry_strategy
            .map(|s| s.with_methods(self.retry_methods));

        Ok(RestClient {
            http,
            base_url: self.base_url.unwrap_or_default(),
            content_type: self.content_type,
            enable_cache: self.enable_cache,
            uncompress_response: self.uncompress_response,
            retry_strategy,
            basic_auth: self.basic_auth,
            metrics: self.metrics,
            mockup: self.mockup,
            headers: Arc::new(RwLock::new(headers)),
            context,
        })
    }
}
