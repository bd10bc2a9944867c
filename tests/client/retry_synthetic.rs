use crate::common::{builder, recording_context, setup_server};
use httpmock::Method::{GET, POST};
use restwell::{RateLimiter, RequestBody, RestContext, RestError, RetryStrategy};
use reqwest::Method;
use std::time::Duration;

#[tokio::test]
async fn get_retries_persistent_5xx_until_strategy_stops() {
    let server = setup_server();

    // This single mock will persistently fail, allowing us to count the retries.
    let fail_mock = server.mock(|when, then| {
        when.method(GET).path("/flaky");
        then.status(503).body("Service Unavailable");
    });

    let max_retries = 3;
    let client = builder(&server)
        .retry_strategy(RetryStrategy::simple(max_retries, Duration::from_millis(1)))
        .build()
        .unwrap();

    let resp = client.get("/flaky").await.unwrap();

    // 1 initial + 3 retries.
    fail_mock.assert_calls(1 + max_retries as usize);
    assert_eq!(resp.status().as_u16(), 503);
    assert!(matches!(
        resp.error_for_status(),
        Err(RestError::Status { status: 503, .. })
    ));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    let client = builder(&server)
        .retry_strategy(RetryStrategy::simple(3, Duration::from_millis(1)))
        .build()
        .unwrap();

    let resp = client.get("/missing").await.unwrap();
    mock.assert_calls(1);
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn post_is_not_retried_by_default() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/orders");
        then.status(500);
    });

    let client = builder(&server)
        .retry_strategy(RetryStrategy::simple(3, Duration::from_millis(1)))
        .build()
        .unwrap();

    let resp = client.post("/orders", RequestBody::Empty).await.unwrap();
    mock.assert_calls(1);
    assert_eq!(resp.status().as_u16(), 500);
}

#[tokio::test]
async fn retry_methods_opt_post_in() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/orders");
        then.status(502);
    });

    let client = builder(&server)
        .retry_strategy(RetryStrategy::simple(2, Duration::from_millis(1)))
        .retry_methods([Method::POST])
        .build()
        .unwrap();

    let _ = client.post("/orders", RequestBody::Empty).await.unwrap();
    mock.assert_calls(3);
}

#[tokio::test]
async fn retries_carry_the_retry_index_and_stop_on_success() {
    let server = setup_server();

    let recovered = server.mock(|when, then| {
        when.method(GET).path("/recovering").header("x-retry", "1");
        then.status(200).body("ok");
    });
    let first = server.mock(|when, then| {
        when.method(GET).path("/recovering").header_missing("x-retry");
        then.status(503);
    });

    let client = builder(&server)
        .retry_strategy(RetryStrategy::simple(5, Duration::from_millis(1)))
        .build()
        .unwrap();

    let resp = client.get("/recovering").await.unwrap();
    first.assert_calls(1);
    recovered.assert_calls(1);
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text(), "ok");
}

#[tokio::test]
async fn exponential_backoff_stops_once_delay_exceeds_max() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/backoff");
        then.status(503);
    });

    // No jitter: waits 1, 2, 4, 8ms; the fifth delay (16ms) is past the 10ms cap.
    let strategy = RetryStrategy::exponential_backoff_with(
        Duration::from_millis(1),
        Duration::from_millis(10),
        0.0,
        2.0,
    )
    .unwrap();
    let client = builder(&server).retry_strategy(strategy).build().unwrap();

    let resp = client.get("/backoff").await.unwrap();
    mock.assert_calls(5);
    assert_eq!(resp.status().as_u16(), 503);
}

#[tokio::test]
async fn retry_limiter_over_quota_breaks_the_loop() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/throttled");
        then.status(503);
    });

    // One token, refilled once a minute: a single retry gets through.
    let (context, recorder) = recording_context();
    let context = context.limiter(RateLimiter::new(1, Duration::from_secs(60)).unwrap());

    let client = builder(&server)
        .retry_strategy(RetryStrategy::simple(5, Duration::from_millis(1)))
        .context(context.clone())
        .build()
        .unwrap();

    let resp = client.get("/throttled").await.unwrap();
    mock.assert_calls(2);
    assert_eq!(resp.status().as_u16(), 503);
    assert_eq!(recorder.count("api_call.retry_break"), 1);
    assert_eq!(context.retry_limiter().available(), 0);
}

#[tokio::test]
async fn clients_sharing_a_context_share_the_retry_budget() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/shared");
        then.status(503);
    });

    let context = RestContext::default().limiter(RateLimiter::new(1, Duration::from_secs(60)).unwrap());
    let strategy = RetryStrategy::simple(5, Duration::from_millis(1));
    let a = builder(&server)
        .retry_strategy(strategy.clone())
        .context(context.clone())
        .build()
        .unwrap();
    let b = builder(&server)
        .retry_strategy(strategy)
        .context(context)
        .build()
        .unwrap();

    let _ = a.get("/shared").await.unwrap();
    mock.assert_calls(2);
    // The budget is spent: b gets its first attempt only.
    let _ = b.get("/shared").await.unwrap();
    mock.assert_calls(3);
}
