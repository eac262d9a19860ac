//! Upload client tests: base64 payloads, hosted-URL round trip.

use std::collections::BTreeMap;

use base64::Engine;
use runchat::{Client, Config, Error, WorkflowId};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for_server(server: &MockServer) -> Client {
    Client::new(Config {
        api_key: Some("rc_test_key".into()),
        base_url: Some(server.uri()),
        upload_url: Some(format!("{}/upload/supabase", server.uri())),
        ..Default::default()
    })
    .expect("client creation should succeed")
}

#[tokio::test]
async fn upload_posts_base64_payload_and_returns_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/supabase"))
        .and(header("Authorization", "Bearer rc_test_key"))
        .and(body_json(json!({
            "base64Image": "aGVsbG8=",
            "filename": "viewport.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://cdn/hosted/viewport.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_server(&server);
    let url = client
        .uploads()
        .upload_base64("aGVsbG8=", "viewport.png")
        .await
        .expect("upload should succeed");
    assert_eq!(url, "https://cdn/hosted/viewport.png");
}

#[tokio::test]
async fn upload_bytes_encodes_before_posting() {
    let server = MockServer::start().await;
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"raw-bytes");

    Mock::given(method("POST"))
        .and(path("/upload/supabase"))
        .and(body_json(json!({
            "base64Image": encoded,
            "filename": "capture.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://cdn/hosted/capture.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_server(&server);
    let url = client
        .uploads()
        .upload_bytes(b"raw-bytes", "capture.png")
        .await
        .expect("upload should succeed");
    assert_eq!(url, "https://cdn/hosted/capture.png");
}

#[tokio::test]
async fn upload_validates_payload_and_filename_without_requests() {
    let server = MockServer::start().await;
    let client = client_for_server(&server);

    let err = client
        .uploads()
        .upload_base64("", "x.png")
        .await
        .expect_err("empty payload should fail");
    assert!(matches!(err, Error::Validation(_)));

    let err = client
        .uploads()
        .upload_base64("aGVsbG8=", "  ")
        .await
        .expect_err("blank filename should fail");
    assert!(matches!(err, Error::Validation(_)));

    let err = client
        .uploads()
        .upload_bytes(&[], "x.png")
        .await
        .expect_err("empty bytes should fail");
    assert!(matches!(err, Error::Validation(_)));

    let requests = server
        .received_requests()
        .await
        .expect("should be able to read received requests");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn upload_missing_url_is_a_payload_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/supabase"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_server(&server);
    let err = client
        .uploads()
        .upload_base64("aGVsbG8=", "x.png")
        .await
        .expect_err("missing url should fail");

    match err {
        Error::Payload(payload) => assert!(payload.message.contains("missing url")),
        other => panic!("expected payload error, got {other:?}"),
    }
}

/// Uploading an image and feeding the hosted URL back as a text input must
/// pass the value through verbatim.
#[tokio::test]
async fn uploaded_url_round_trips_as_input_identity() {
    let server = MockServer::start().await;
    let hosted = "https://cdn/hosted/roundtrip.png";

    Mock::given(method("POST"))
        .and(path("/upload/supabase"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": hosted})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wf-123"))
        .and(body_json(json!({
            "inputs": { "image_n1": hosted }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "echo_n2", "data": [hosted]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_server(&server);
    let url = client
        .uploads()
        .upload_base64("aGVsbG8=", "roundtrip.png")
        .await
        .expect("upload should succeed");
    assert_eq!(url, hosted);

    let mut inputs = BTreeMap::new();
    inputs.insert("image_n1".to_string(), json!(url));
    let payload = client
        .workflows()
        .execute(&WorkflowId::new("wf-123"), &inputs, None)
        .await
        .expect("execution should succeed");

    assert_eq!(
        payload.output("echo_n2").unwrap().primary_text().as_deref(),
        Some(hosted)
    );
}
