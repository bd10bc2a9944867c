use crate::common::{builder, setup_server};
use flate2::Compression;
use flate2::write::GzEncoder;
use httpmock::Method::GET;
use restwell::RestError;
use std::io::Write;

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

#[tokio::test]
async fn gzip_body_is_decompressed_when_enabled() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/archive");
        then.status(200)
            .header("content-encoding", "gzip")
            .body(gzip(b"{\"ok\":true}"));
    });

    let client = builder(&server).uncompress_response(true).build().unwrap();
    let resp = client.get("/archive").await.unwrap();
    assert_eq!(resp.text(), "{\"ok\":true}");
}

#[tokio::test]
async fn gzip_body_is_left_alone_when_disabled() {
    let server = setup_server();
    let packed = gzip(b"hello");
    let expected = packed.clone();
    server.mock(move |when, then| {
        when.method(GET).path("/archive");
        then.status(200).header("content-encoding", "gzip").body(packed.clone());
    });

    let client = builder(&server).build().unwrap();
    let resp = client.get("/archive").await.unwrap();
    assert_eq!(resp.bytes().as_ref(), expected.as_slice());
}

#[tokio::test]
async fn empty_gzip_body_is_not_an_error() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/empty");
        then.status(200).header("content-type", "application/x-gzip");
    });

    let client = builder(&server).uncompress_response(true).build().unwrap();
    let resp = client.get("/empty").await.unwrap();
    assert!(resp.bytes().is_empty());
}

#[tokio::test]
async fn corrupt_gzip_body_is_a_decompress_error() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/corrupt");
        then.status(200)
            .header("content-encoding", "gzip")
            .body("definitely not gzip");
    });

    let client = builder(&server).uncompress_response(true).build().unwrap();
    let err = client.get("/corrupt").await.unwrap_err();
    assert!(matches!(err, RestError::Decompress(_)));
}
