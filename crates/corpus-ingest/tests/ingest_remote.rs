//! URL sources served by a mock HTTP server

mod common;

use common::{corpus_zip, ingest, rows};
use corpus_ingest::{Error, FieldSelector, IngestConfig, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_text_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/speeches/inaugural.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Fellow citizens"))
        .mount(&server)
        .await;

    let url = format!("{}/speeches/inaugural.txt", server.uri());
    let outcome = ingest(IngestConfig::default(), &url).await.unwrap();
    assert_eq!(
        rows(&outcome),
        vec![("inaugural.txt".to_string(), "Fellow citizens".to_string())]
    );
}

#[tokio::test]
async fn test_extension_from_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "text,year\nhello,2020\nworld,2021\n",
                "text/csv; charset=utf-8",
            ),
        )
        .mount(&server)
        .await;

    let config = IngestConfig {
        text_field: Some(FieldSelector::from("text")),
        ..Default::default()
    };
    let outcome = ingest(config, &format!("{}/export", server.uri())).await.unwrap();
    assert_eq!(outcome.table.len(), 2);
    assert_eq!(outcome.table.get(1, "year"), Some(&Value::Integer(2021)));
}

#[tokio::test]
async fn test_zip_url() {
    let server = MockServer::start().await;
    let staging = tempfile::tempdir().unwrap();
    let zip_path = staging.path().join("corpus.zip");
    corpus_zip(&zip_path);

    Mock::given(method("GET"))
        .and(path("/corpus.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(std::fs::read(&zip_path).unwrap()))
        .mount(&server)
        .await;

    let outcome = ingest(IngestConfig::default(), &format!("{}/corpus.zip", server.uri()))
        .await
        .unwrap();
    assert_eq!(outcome.table.len(), 3);
    assert_eq!(outcome.table.rows[2].doc_id, "c.txt");
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.txt", server.uri());
    let err = ingest(IngestConfig::default(), &url).await.unwrap_err();
    match err {
        Error::SourceResolution { locator, message } => {
            assert_eq!(locator, url);
            assert!(message.contains("404"));
        }
        other => panic!("expected resolution error, got {other}"),
    }
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = IngestConfig {
        fetch_timeout_secs: 1,
        ..Default::default()
    };
    let err = ingest(config, &format!("{}/slow.txt", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceResolution { ref message, .. } if message.contains("timed out")));
}
