// crates/gundi-dispatcher-core/tests/observation_model.rs
// ============================================================================
// Module: Observation Model Tests
// Description: Payload parsing for each stream type, single and batch forms.
// ============================================================================
//! ## Overview
//! Confirms canonical payloads parse from the upstream JSON shapes and keep
//! unknown fields.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use gundi_dispatcher_core::Batch;
use gundi_dispatcher_core::CanonicalObservation;
use gundi_dispatcher_core::StreamType;
use gundi_dispatcher_core::prune_nulls;
use serde_json::json;

#[test]
fn event_payload_parses_with_location_and_details() {
    let value = json!({
        "title": "Animal Detected Test Event",
        "event_type": "wildlife_sighting_rep",
        "event_details": {"species": "Lion"},
        "time": "2023-07-04 21:38:00+00:00",
        "location": {"longitude": 13.783_064, "latitude": 13.688_635},
        "provider_key": "gundi_traptagger_ddd0946d"
    });
    let parsed = CanonicalObservation::from_value(StreamType::Event, value).unwrap();
    let CanonicalObservation::Event(Batch::One(event)) = parsed else {
        panic!("expected single event");
    };
    assert_eq!(event.title.as_deref(), Some("Animal Detected Test Event"));
    assert_eq!(event.location.unwrap().latitude, 13.688_635);
    assert_eq!(event.extra.get("provider_key"), Some(&json!("gundi_traptagger_ddd0946d")));
}

#[test]
fn observation_batch_preserves_order() {
    let value = json!([
        {
            "manufacturer_id": "a",
            "recorded_at": "2023-07-04T21:38:00Z",
            "location": {"lat": 1.0, "lon": 2.0}
        },
        {
            "manufacturer_id": "b",
            "recorded_at": "2023-07-04T21:39:00Z",
            "location": {"lat": 3.0, "lon": 4.0}
        }
    ]);
    let parsed = CanonicalObservation::from_value(StreamType::Observation, value).unwrap();
    let CanonicalObservation::Observation(batch) = parsed else {
        panic!("expected observation");
    };
    assert!(batch.is_list());
    let ids: Vec<&str> = batch.items().iter().map(|item| item.manufacturer_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn observation_without_location_is_rejected() {
    let value = json!({"manufacturer_id": "a", "recorded_at": "2023-07-04T21:38:00Z"});
    assert!(CanonicalObservation::from_value(StreamType::Observation, value).is_err());
}

#[test]
fn attachment_and_update_payloads_parse() {
    let attachment = CanonicalObservation::from_value(
        StreamType::Attachment,
        json!({"file_path": "attachments/photo.jpg"}),
    )
    .unwrap();
    assert_eq!(attachment.stream_type(), StreamType::Attachment);

    let update = CanonicalObservation::from_value(
        StreamType::EventUpdate,
        json!({"changes": {"state": "resolved"}}),
    )
    .unwrap();
    let CanonicalObservation::EventUpdate(Batch::One(update)) = update else {
        panic!("expected single update");
    };
    assert_eq!(update.changes.get("state"), Some(&json!("resolved")));
}

#[test]
fn text_message_requires_text() {
    let value = json!({"sender": "2075752244", "message_time": "2024-01-01T00:00:00Z"});
    assert!(CanonicalObservation::from_value(StreamType::TextMessage, value).is_err());
}

#[test]
fn empty_list_is_rejected_for_every_stream_type() {
    for stream_type in StreamType::ALL {
        assert!(
            CanonicalObservation::from_value(stream_type, json!([])).is_err(),
            "stream {stream_type}"
        );
    }
}

#[test]
fn legacy_geo_event_reuses_event_payload() {
    let value = json!({
        "title": "Rainfall",
        "event_type": "rainfall_rep",
        "event_details": {"amount_mm": 6, "height_m": 3},
        "time": "2023-03-07 11:24:02-07:00",
        "location": {"longitude": -55.784_98, "latitude": 20.806_785}
    });
    let parsed = CanonicalObservation::from_value(StreamType::GeoEvent, value).unwrap();
    assert_eq!(parsed.stream_type(), StreamType::GeoEvent);
    let CanonicalObservation::GeoEvent(Batch::One(event)) = parsed else {
        panic!("expected single geo event");
    };
    assert_eq!(event.event_type.as_deref(), Some("rainfall_rep"));
}

#[test]
fn camera_trap_location_may_be_a_json_string() {
    let value = json!({
        "file": "camera-trap.jpg",
        "camera_name": "Mariano's Camera",
        "camera_description": "test camera",
        "time": "2023-03-07 11:51:00-03:00",
        "location": "{\"longitude\": -122.5, \"latitude\": 48.65}"
    });
    let parsed = CanonicalObservation::from_value(StreamType::CameraTrap, value).unwrap();
    let CanonicalObservation::CameraTrap(Batch::One(report)) = parsed else {
        panic!("expected single camera trap report");
    };
    assert_eq!(report.file, "camera-trap.jpg");
    assert!(report.location.unwrap().is_string());
}

#[test]
fn prune_nulls_drops_null_members_recursively() {
    let pruned = prune_nulls(json!({"a": null, "b": {"c": null, "d": 1}, "e": [null, {"f": null}]}));
    assert_eq!(pruned, json!({"b": {"d": 1}, "e": [null, {}]}));
}
