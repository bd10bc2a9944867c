use crate::common::{recording_context, setup_server};
use httpmock::Method::GET;
use restwell::{RestClient, RestError, RetryStrategy};
use std::time::Duration;

#[tokio::test]
async fn slow_response_times_out_as_transport_error() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200).delay(Duration::from_millis(800));
    });

    let client = RestClient::builder()
        .base_url(server.base_url())
        .connect_timeout(Duration::from_millis(100))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.get("/slow").await.unwrap_err();
    assert!(matches!(err, RestError::Http(_)));
    assert!(!err.is_construction());
    mock.assert_calls(1);
}

#[tokio::test]
async fn transport_errors_are_retried() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200).delay(Duration::from_millis(800));
    });

    let (context, recorder) = recording_context();
    let client = RestClient::builder()
        .base_url(server.base_url())
        .connect_timeout(Duration::from_millis(100))
        .timeout(Duration::from_millis(100))
        .retry_strategy(RetryStrategy::simple(2, Duration::from_millis(1)))
        .context(context)
        .build()
        .unwrap();

    let err = client.get("/slow").await.unwrap_err();
    assert!(matches!(err, RestError::Http(_)));
    mock.assert_calls(3);

    let statuses: Vec<_> = recorder
        .tags("api_call.time")
        .iter()
        .map(|t| t.get("status").map(str::to_owned))
        .collect();
    assert_eq!(statuses, vec![Some("error".to_owned()); 3]);
}

#[tokio::test]
async fn malformed_url_is_a_construction_error() {
    let client = RestClient::builder().base_url("not a url").build().unwrap();
    let err = client.get("/x").await.unwrap_err();
    assert!(matches!(err, RestError::Url(_)));
    assert!(err.is_construction());
}
