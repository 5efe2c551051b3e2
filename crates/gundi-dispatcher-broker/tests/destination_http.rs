// crates/gundi-dispatcher-broker/tests/destination_http.rs
// ============================================================================
// Module: Destination HTTP Client Tests
// Description: Destination REST client against a local fake server.
// Purpose: Validate request shapes, auth and error mapping on the wire.
// Dependencies: gundi-dispatcher-broker, gundi-dispatcher-core, reqwest, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Runs [`HttpDestinationClient`] against a `tiny_http` server on a thread and
//! inspects the captured requests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use gundi_dispatcher_broker::Credentials;
use gundi_dispatcher_broker::HttpDestinationClient;
use gundi_dispatcher_core::BlobFile;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::ExternalId;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::PushEndpoints;
use serde_json::Value;
use serde_json::json;
use url::Url;

use crate::common::PROVIDER_KEY;
use crate::common::spawn_server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn client_for(base_url: &str, credentials: Credentials, endpoints: PushEndpoints) -> HttpDestinationClient {
    HttpDestinationClient::new(
        reqwest::Client::new(),
        Url::parse(&format!("{base_url}/api/v1.0")).unwrap(),
        Url::parse(&format!("{base_url}/oauth2/token")).unwrap(),
        credentials,
        ProviderKey::new(PROVIDER_KEY),
        endpoints,
    )
}

fn token() -> Credentials {
    Credentials::Token("er-token".to_string())
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// SECTION: Events
// ============================================================================

#[tokio::test]
async fn create_event_posts_json_with_bearer_and_provider_key() {
    let (base_url, handle) =
        spawn_server(vec![(201, r#"{"data": {"id": "er-1", "serial_number": 7}, "status": {"code": 201}}"#.to_string())]);
    let client = client_for(&base_url, token(), PushEndpoints::default());

    let response = client.create_event(json!({"title": "Animal Detected"})).await.unwrap();

    assert_eq!(response, json!({"id": "er-1", "serial_number": 7}));
    let requests = handle.join().expect("server thread");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/api/v1.0/events");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer er-token"));
    let body = json_body(&requests[0].body);
    assert_eq!(body["title"], "Animal Detected");
    assert_eq!(body["provider_key"], PROVIDER_KEY);
}

#[tokio::test]
async fn service_unavailable_keeps_status_and_body() {
    let (base_url, handle) = spawn_server(vec![(503, "gateway offline".to_string())]);
    let client = client_for(&base_url, token(), PushEndpoints::default());

    let err = client.create_event(json!({"title": "x"})).await.unwrap_err();

    assert!(matches!(err, DeliveryError::ServiceUnavailable { .. }), "got {err:?}");
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.response_body(), Some("gateway offline"));
    assert_eq!(handle.join().expect("server thread").len(), 1);
}

#[tokio::test]
async fn patch_event_targets_event_path_without_provider_key() {
    let (base_url, handle) = spawn_server(vec![(200, r#"{"id": "er-1"}"#.to_string())]);
    let client = client_for(&base_url, token(), PushEndpoints::default());

    client.patch_event(&ExternalId::new("er-1"), json!({"state": "resolved"})).await.unwrap();

    let requests = handle.join().expect("server thread");
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].url, "/api/v1.0/events/er-1");
    assert_eq!(json_body(&requests[0].body), json!({"state": "resolved"}));
}

#[tokio::test]
async fn attachment_is_uploaded_as_multipart() {
    let (base_url, handle) = spawn_server(vec![(201, r#"{"id": "att-1"}"#.to_string())]);
    let client = client_for(&base_url, token(), PushEndpoints::default());
    let file = BlobFile::new("attachments/photo.jpg", b"jpeg-bytes".to_vec());

    client.post_event_attachment(&ExternalId::new("er-1"), &file).await.unwrap();

    let requests = handle.join().expect("server thread");
    assert_eq!(requests[0].url, "/api/v1.0/events/er-1/attachments");
    assert!(requests[0].content_type.as_deref().unwrap().starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"filecontent.file\""));
    assert!(body.contains("filename=\"photo.jpg\""));
    assert!(body.contains("jpeg-bytes"));
}

#[tokio::test]
async fn camera_trap_report_posts_fields_and_image_to_provider_path() {
    let (base_url, handle) = spawn_server(vec![(201, r#"{"group_id": "ct-1"}"#.to_string())]);
    let client = client_for(&base_url, token(), PushEndpoints::default());
    let file = BlobFile::new("camera-trap.jpg", b"trap-bytes".to_vec());
    let report = json!({
        "file": "camera-trap.jpg",
        "camera_name": "Mariano's Camera",
        "location": {"latitude": 48.65, "longitude": -122.5}
    });

    let response = client.post_camera_trap_report(report, &file).await.unwrap();

    assert_eq!(response["group_id"], "ct-1");
    let requests = handle.join().expect("server thread");
    assert_eq!(requests[0].url, format!("/api/v1.0/sensors/camera-trap/{PROVIDER_KEY}/status"));
    assert!(requests[0].content_type.as_deref().unwrap().starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"camera_name\""));
    assert!(body.contains("Mariano's Camera"));
    assert!(body.contains("\"latitude\":48.65"));
    assert!(body.contains("name=\"filecontent.file\""));
    assert!(body.contains("trap-bytes"));
}

#[tokio::test]
async fn camera_trap_report_must_be_an_object() {
    let client = client_for("http://127.0.0.1:9", token(), PushEndpoints::default());
    let file = BlobFile::new("camera-trap.jpg", b"trap-bytes".to_vec());
    let err = client.post_camera_trap_report(json!(["not", "an", "object"]), &file).await.unwrap_err();
    assert!(matches!(err, DeliveryError::InvalidPayload(_)));
}

// ============================================================================
// SECTION: Observations And Messages
// ============================================================================

#[tokio::test]
async fn observation_path_override_substitutes_provider_key() {
    let (base_url, handle) = spawn_server(vec![(201, String::new())]);
    let endpoints = PushEndpoints {
        observations: "sensors/generic/{provider_key}/status".to_string(),
        ..PushEndpoints::default()
    };
    let client = client_for(&base_url, token(), endpoints);

    let response = client.post_observation(json!({"manufacturer_id": "collar-1"})).await.unwrap();

    assert_eq!(response, Value::Null);
    let requests = handle.join().expect("server thread");
    assert_eq!(requests[0].url, format!("/api/v1.0/sensors/generic/{PROVIDER_KEY}/status"));
    assert_eq!(json_body(&requests[0].body)["provider_key"], PROVIDER_KEY);
}

#[tokio::test]
async fn message_sends_manufacturer_id_as_query_parameter() {
    let (base_url, handle) = spawn_server(vec![(201, r#"{"id": "msg-1"}"#.to_string())]);
    let client = client_for(&base_url, token(), PushEndpoints::default());

    client.post_message("2075752244", json!({"text": "Help"})).await.unwrap();

    let requests = handle.join().expect("server thread");
    assert_eq!(requests[0].url, "/api/v1.0/messages?manufacturer_id=2075752244");
    assert!(json_body(&requests[0].body).get("provider_key").is_none());
}

// ============================================================================
// SECTION: Password Grant
// ============================================================================

#[tokio::test]
async fn password_grant_runs_once_and_token_is_reused() {
    let (base_url, handle) = spawn_server(vec![
        (200, r#"{"access_token": "issued-token", "token_type": "Bearer"}"#.to_string()),
        (201, r#"{"id": "er-1"}"#.to_string()),
        (201, r#"{"id": "er-2"}"#.to_string()),
    ]);
    let credentials = Credentials::Password {
        username: "dispatcher".to_string(),
        password: "secret".to_string(),
    };
    let client = client_for(&base_url, credentials, PushEndpoints::default());

    client.create_event(json!({"title": "a"})).await.unwrap();
    client.create_event(json!({"title": "b"})).await.unwrap();

    let requests = handle.join().expect("server thread");
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].url, "/oauth2/token");
    let form = String::from_utf8_lossy(&requests[0].body);
    assert!(form.contains("grant_type=password"));
    assert!(form.contains("username=dispatcher"));
    assert!(form.contains("client_id=das_web_client"));
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer issued-token"));
    assert_eq!(requests[2].authorization.as_deref(), Some("Bearer issued-token"));
}

#[tokio::test]
async fn rejected_password_grant_is_bad_credentials() {
    let (base_url, handle) = spawn_server(vec![(401, r#"{"error": "invalid_grant"}"#.to_string())]);
    let credentials = Credentials::Password {
        username: "dispatcher".to_string(),
        password: "wrong".to_string(),
    };
    let client = client_for(&base_url, credentials, PushEndpoints::default());

    let err = client.create_event(json!({"title": "a"})).await.unwrap_err();

    assert!(matches!(err, DeliveryError::BadCredentials { status_code: 401, .. }), "got {err:?}");
    assert_eq!(handle.join().expect("server thread").len(), 1);
}
