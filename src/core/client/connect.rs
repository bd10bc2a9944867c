//! Connector telemetry: one `conn_new` sample per dial, tagged `ok` or `fail`.

use crate::telemetry::{Tags, Telemetry};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Wraps the transport's connector so new connections are reported.
#[derive(Clone, Debug)]
pub(crate) struct ConnectTelemetryLayer {
    sink: Arc<dyn Telemetry>,
    tags: Tags,
}

impl ConnectTelemetryLayer {
    pub(crate) fn new(sink: Arc<dyn Telemetry>, tags: Tags) -> Self {
        Self { sink, tags }
    }
}

impl<S> Layer<S> for ConnectTelemetryLayer {
    type Service = ConnectTelemetry<S>;

    fn layer(&self, upstream: S) -> Self::Service {
        ConnectTelemetry {
            upstream,
            sink: Arc::clone(&self.sink),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ConnectTelemetry<S> {
    upstream: S,
    sink: Arc<dyn Telemetry>,
    tags: Tags,
}

impl<S, R> Service<R> for ConnectTelemetry<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx)
    }

    fn call(&mut self, target: R) -> Self::Future {
        let dial = self.upstream.call(target);
        let sink = Arc::clone(&self.sink);
        let tags = self.tags.clone();
        let started = Instant::now();

        Box::pin(async move {
            let result = dial.await;
            let outcome = if result.is_ok() { "ok" } else { "fail" };
            sink.record(
                "conn_new",
                started.elapsed().as_secs_f64() * 1000.0,
                &tags.add("result", outcome),
            );
            result
        })
    }
}
