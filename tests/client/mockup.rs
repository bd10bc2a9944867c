use crate::common::{builder, setup_server};
use httpmock::Method::GET;
use url::Url;

#[tokio::test]
async fn requests_are_routed_to_the_mock_server() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/items")
            .query_param("id", "9")
            .header("x-original-url", "https://api.example.test/v2/items?id=9");
        then.status(200).body("mocked");
    });

    let client = builder(&server)
        .base_url("https://api.example.test")
        .mockup_server(Url::parse(&server.base_url()).unwrap())
        .build()
        .unwrap();

    let resp = client.get("/v2/items?id=9").await.unwrap();
    mock.assert();
    assert_eq!(resp.text(), "mocked");
    assert_eq!(resp.url(), "https://api.example.test/v2/items?id=9");
}

#[tokio::test]
async fn without_mockup_there_is_no_original_url_header() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v2/items").header_missing("x-original-url");
        then.status(200);
    });

    let client = builder(&server).build().unwrap();
    client.get("/v2/items").await.unwrap();
    mock.assert();
}
