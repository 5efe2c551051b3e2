// crates/gundi-dispatcher-server/tests/push_endpoint.rs
// ============================================================================
// Module: Push Endpoint Tests
// Description: HTTP status mapping for push deliveries.
// Purpose: Ensure acknowledgements follow processing outcomes.
// Dependencies: gundi-dispatcher-server, reqwest, tokio
// ============================================================================

//! ## Overview
//! Drives a live push endpoint over loopback HTTP.

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

use common::DEAD_LETTER_TOPIC;
use common::DESTINATION;
use common::EVENTS_TOPIC;
use common::TestServer;
use common::push_body;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn healthz_reports_ok() {
    let server = TestServer::start().await;
    let response = reqwest::get(format!("{}/healthz", server.base_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    server.stop().await;
}

#[tokio::test]
async fn delivered_push_is_acknowledged() {
    let mut server = TestServer::start().await;
    let response = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .json(&push_body(DESTINATION))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let events = server.sink.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Animal Detected");

    let published = server.events.try_recv().unwrap();
    assert_eq!(published.topic, EVENTS_TOPIC);
    let event: Value = serde_json::from_slice(&published.message.data).unwrap();
    assert_eq!(event["event_type"], "ObservationDelivered");
    server.stop().await;
}

#[tokio::test]
async fn body_that_is_not_an_envelope_is_a_bad_request() {
    let server = TestServer::start().await;
    let response = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.sink.events.lock().unwrap().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn unknown_destination_asks_for_redelivery() {
    let mut server = TestServer::start().await;
    let response = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .json(&push_body("00000000-0000-0000-0000-000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(server.sink.events.lock().unwrap().is_empty());
    assert!(server.dead_letters.try_recv().is_err());
    server.stop().await;
}

#[tokio::test]
async fn stale_cloud_event_time_is_dead_lettered_and_acknowledged() {
    let mut server = TestServer::start().await;
    let response = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .header("ce-time", "2024-04-29T00:00:00Z")
        .json(&push_body(DESTINATION))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(server.sink.events.lock().unwrap().is_empty());

    let dead = server.dead_letters.try_recv().unwrap();
    assert_eq!(dead.topic, DEAD_LETTER_TOPIC);
    assert_eq!(
        dead.message.attributes.get("destination_id").map(String::as_str),
        Some(DESTINATION)
    );
    server.stop().await;
}
