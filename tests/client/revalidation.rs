use crate::common::{builder, setup_server};
use httpmock::Method::GET;

#[tokio::test]
async fn stale_etag_entry_is_revalidated_with_if_none_match() {
    let server = setup_server();

    let mut initial = server.mock(|when, then| {
        when.method(GET).path("/doc");
        then.status(200).header("etag", "\"v1\"").body("payload");
    });

    let client = builder(&server).enable_cache(true).build().unwrap();

    let first = client.get("/doc").await.unwrap();
    initial.assert_calls(1);
    assert!(first.revalidate());
    assert_eq!(first.etag(), Some("\"v1\""));
    initial.delete();

    let not_modified = server.mock(|when, then| {
        when.method(GET).path("/doc").header("if-none-match", "\"v1\"");
        then.status(304);
    });

    let second = client.get("/doc").await.unwrap();
    not_modified.assert_calls(1);
    assert!(second.cache_hit());
    assert_eq!(second.status().as_u16(), 200);
    assert_eq!(second.text(), "payload");
}

#[tokio::test]
async fn last_modified_entry_is_revalidated_with_if_modified_since() {
    let server = setup_server();
    let stamp = "Sun, 06 Nov 1994 08:49:37 GMT";

    let mut initial = server.mock(|when, then| {
        when.method(GET).path("/report");
        then.status(200).header("last-modified", stamp).body("report");
    });

    let client = builder(&server).enable_cache(true).build().unwrap();
    client.get("/report").await.unwrap();
    initial.assert_calls(1);
    initial.delete();

    let not_modified = server.mock(|when, then| {
        when.method(GET).path("/report").header("if-modified-since", stamp);
        then.status(304);
    });

    let second = client.get("/report").await.unwrap();
    not_modified.assert_calls(1);
    assert_eq!(second.text(), "report");
}

#[tokio::test]
async fn changed_resource_replaces_the_stale_entry() {
    let server = setup_server();

    let mut v1 = server.mock(|when, then| {
        when.method(GET).path("/doc");
        then.status(200).header("etag", "\"v1\"").body("old");
    });
    let client = builder(&server).enable_cache(true).build().unwrap();
    client.get("/doc").await.unwrap();
    v1.delete();

    let mut v2 = server.mock(|when, then| {
        when.method(GET).path("/doc").header("if-none-match", "\"v1\"");
        then.status(200).header("etag", "\"v2\"").body("new");
    });
    let changed = client.get("/doc").await.unwrap();
    assert!(!changed.cache_hit());
    assert_eq!(changed.text(), "new");
    v2.assert_calls(1);
    v2.delete();

    let not_modified = server.mock(|when, then| {
        when.method(GET).path("/doc").header("if-none-match", "\"v2\"");
        then.status(304);
    });
    assert_eq!(client.get("/doc").await.unwrap().text(), "new");
    not_modified.assert_calls(1);
}

#[tokio::test]
async fn conditional_headers_are_stripped_when_cache_is_disabled() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/doc")
            .header_missing("if-none-match")
            .header("x-custom", "kept");
        then.status(200);
    });

    let client = builder(&server)
        .header("If-None-Match", "\"stale\"")
        .header("X-Custom", "kept")
        .build()
        .unwrap();

    client.get("/doc").await.unwrap();
    mock.assert_calls(1);
}
