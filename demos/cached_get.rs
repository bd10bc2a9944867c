use restwell::{RestClient, RetryStrategy};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=restwell=trace shows attempts, cache hits and revalidations.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restwell=debug")))
        .init();

    // 1. A client that caches reads and retries 5xx with jittered backoff.
    let client = RestClient::builder()
        .base_url("https://httpbin.org")
        .timeout(Duration::from_secs(5))
        .enable_cache(true)
        .retry_strategy(RetryStrategy::exponential_backoff(
            Duration::from_millis(200),
            Duration::from_secs(3),
        )?)
        .build()?;

    // 2. `/cache/60` answers with `Cache-Control: public, max-age=60`.
    for round in 1..=2 {
        let resp = client.get("/cache/60").await?.error_for_status()?;
        println!(
            "round {round}: status={} cache_hit={} expires_at={:?}",
            resp.status(),
            resp.cache_hit(),
            resp.expires_at()
        );
    }

    // 3. `/etag/{etag}` is revalidated with If-None-Match once the entry is stale.
    for round in 1..=2 {
        let resp = client.get("/etag/demo-v1").await?;
        println!(
            "etag round {round}: status={} cache_hit={} etag={:?}",
            resp.status(),
            resp.cache_hit(),
            resp.etag()
        );
    }

    println!(
        "retry tokens left: {}/{}",
        client.context().retry_limiter().available(),
        client.context().retry_limiter().capacity()
    );
    Ok(())
}
