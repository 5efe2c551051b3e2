// crates/gundi-dispatcher-core/tests/system_events.rs
// ============================================================================
// Module: System Event Tests
// Description: Wire shape of delivered and failed notifications.
// ============================================================================
//! ## Overview
//! Checks the JSON envelope published to the dispatcher events topic.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use gundi_dispatcher_core::DataProviderId;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DispatchRecord;
use gundi_dispatcher_core::ErrorDetails;
use gundi_dispatcher_core::ExternalId;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::SystemEvent;
use gundi_dispatcher_core::Timestamp;
use gundi_dispatcher_core::UpdatedObservation;
use serde_json::Value;

/// Fixed timestamp used across the tests.
fn now() -> Timestamp {
    Timestamp::from_unix_seconds(1_700_000_000).unwrap()
}

/// Record for a delivered event.
fn record() -> DispatchRecord {
    DispatchRecord {
        gundi_id: GundiId::new("g-1"),
        related_to: None,
        external_id: Some(ExternalId::new("er-1")),
        data_provider_id: Some(DataProviderId::new("p-1")),
        destination_id: DestinationId::new("d-1"),
        delivered_at: now(),
    }
}

#[test]
fn delivered_event_has_envelope_fields() {
    let event = SystemEvent::observation_delivered(record(), now());
    let json: Value = serde_json::from_slice(&event.to_json_bytes().unwrap()).unwrap();
    assert_eq!(json["event_type"], "ObservationDelivered");
    assert_eq!(json["schema_version"], "v1");
    assert_eq!(json["payload"]["gundi_id"], "g-1");
    assert_eq!(json["payload"]["external_id"], "er-1");
    assert_eq!(json["payload"]["destination_id"], "d-1");
    assert_eq!(json["payload"]["related_to"], Value::Null);
    assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
    assert!(json["event_id"].as_str().is_some_and(|id| id.len() == 36));
}

#[test]
fn failure_event_carries_status_and_body() {
    let err = DeliveryError::from_status(503, "Service Unavailable");
    let event = SystemEvent::observation_delivery_failed(
        ErrorDetails::from_delivery_error(&err, record()),
        now(),
    );
    let json: Value = serde_json::from_slice(&event.to_json_bytes().unwrap()).unwrap();
    assert_eq!(json["event_type"], "ObservationDeliveryFailed");
    assert_eq!(json["schema_version"], "v2");
    assert_eq!(json["payload"]["server_response_status"], 503);
    assert_eq!(json["payload"]["server_response_body"], "Service Unavailable");
    assert_eq!(json["payload"]["observation"]["gundi_id"], "g-1");
    assert!(json["payload"]["error"].as_str().is_some_and(|text| text.starts_with("ServiceUnavailable")));
}

#[test]
fn transport_failure_has_no_status() {
    let err = DeliveryError::Transport("connection refused".to_string());
    let update = UpdatedObservation {
        gundi_id: GundiId::new("g-2"),
        related_to: Some(GundiId::new("g-1")),
        data_provider_id: None,
        destination_id: DestinationId::new("d-1"),
        updated_at: now(),
    };
    let event = SystemEvent::observation_update_failed(
        ErrorDetails::from_delivery_error(&err, update),
        now(),
    );
    let json: Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event_type"], "ObservationUpdateFailed");
    assert_eq!(json["payload"]["server_response_status"], Value::Null);
    assert_eq!(json["payload"]["server_response_body"], "");
    assert_eq!(json["payload"]["observation"]["related_to"], "g-1");
}

#[test]
fn each_event_gets_a_fresh_id() {
    let first = SystemEvent::observation_delivered(record(), now());
    let second = SystemEvent::observation_delivered(record(), now());
    assert_ne!(first.event_id, second.event_id);
}
