use crate::common::{builder, setup_server};
use httpmock::Method::{POST, PUT};
use restwell::{ContentType, RequestBody, RestError};
use serde_json::json;

#[tokio::test]
async fn json_body_is_sent_with_json_headers() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/orders")
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json_body(json!({"sku": "A-1", "qty": 2}));
        then.status(201);
    });

    let client = builder(&server).build().unwrap();
    let body = RequestBody::json(&json!({"sku": "A-1", "qty": 2})).unwrap();
    let resp = client.post("/orders", body).await.unwrap();

    mock.assert();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn form_body_is_url_encoded() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/profile")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("name=Ada+Lovelace&lang=en");
        then.status(204);
    });

    let client = builder(&server).content_type(ContentType::Form).build().unwrap();
    let body = RequestBody::form([("name", "Ada Lovelace"), ("lang", "en")]);
    client.put("/profile", body).await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn raw_bytes_go_out_untouched() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload").body("\u{1}\u{2}raw");
        then.status(200);
    });

    let client = builder(&server).content_type(ContentType::Bytes).build().unwrap();
    client.post("/upload", b"\x01\x02raw".to_vec()).await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn mismatched_body_fails_before_sending() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200);
    });

    let client = builder(&server).content_type(ContentType::Bytes).build().unwrap();
    let err = client
        .post("/upload", json!({"not": "bytes"}))
        .await
        .unwrap_err();

    assert!(matches!(err, RestError::BodyMismatch { expected: "bytes", found: "json" }));
    assert!(err.is_construction());
    mock.assert_calls(0);
}
