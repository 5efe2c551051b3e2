// crates/gundi-dispatcher-core/tests/routing_attributes.rs
// ============================================================================
// Module: Routing Attribute Tests
// Description: Attribute map parsing, null handling, and rendering.
// ============================================================================
//! ## Overview
//! Validates that queue attributes map onto [`RoutingAttributes`] with
//! null sentinels normalized and unknown keys preserved.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use gundi_dispatcher_core::AttributeError;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::RoutingAttributes;
use gundi_dispatcher_core::SchemaVersion;
use gundi_dispatcher_core::StreamType;

/// Builds the attribute map a v2 producer sends for an event.
fn event_attributes() -> BTreeMap<String, String> {
    [
        ("gundi_version", "v2"),
        ("provider_key", "gundi_traptagger_d88ac520"),
        ("gundi_id", "23ca4b15-18b6-4cf4-9da6-36dd69c6f638"),
        ("related_to", "None"),
        ("stream_type", "ev"),
        ("source_id", "afa0d606-c143-4705-955d-68133645db6d"),
        ("external_source_id", "Xyz123"),
        ("destination_id", "338225f3-91f9-4fe1-b013-353a229ce504"),
        ("data_provider_id", "ddd0946d-15b0-4308-b93d-e0470b6d33b6"),
        ("annotations", "{}"),
        ("tracing_context", "{}"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

#[test]
fn parses_v2_event_attributes() {
    let attributes = RoutingAttributes::from_map(&event_attributes()).unwrap();
    assert_eq!(attributes.gundi_version, SchemaVersion::V2);
    assert_eq!(attributes.parsed_stream_type(), Some(StreamType::Event));
    assert_eq!(attributes.related_to, None);
    assert_eq!(attributes.extra.get("annotations").map(String::as_str), Some("{}"));
    assert_eq!(
        attributes.destination_id.as_ref().map(|id| id.as_str()),
        Some("338225f3-91f9-4fe1-b013-353a229ce504")
    );
}

#[test]
fn related_to_null_spellings_normalize_to_none() {
    for sentinel in ["", "None", "null"] {
        let mut map = event_attributes();
        map.insert("related_to".to_string(), sentinel.to_string());
        let attributes = RoutingAttributes::from_map(&map).unwrap();
        assert_eq!(attributes.related_to, None, "sentinel {sentinel:?}");
    }
}

#[test]
fn related_lookup_prefers_related_to() {
    let mut map = event_attributes();
    map.insert("related_to".to_string(), "parent-1".to_string());
    let attributes = RoutingAttributes::from_map(&map).unwrap();
    assert_eq!(attributes.related_lookup_id(), &GundiId::new("parent-1"));
}

#[test]
fn missing_gundi_id_is_reported() {
    let mut map = event_attributes();
    map.remove("gundi_id");
    assert_eq!(RoutingAttributes::from_map(&map), Err(AttributeError::Missing("gundi_id")));
}

#[test]
fn unknown_version_is_reported() {
    let mut map = event_attributes();
    map.insert("gundi_version".to_string(), "v9".to_string());
    assert_eq!(
        RoutingAttributes::from_map(&map),
        Err(AttributeError::UnsupportedVersion("v9".to_string()))
    );
}

/// Builds the attribute map a v1 producer sends for a position.
fn position_attributes() -> BTreeMap<String, String> {
    [
        ("observation_type", "ps"),
        ("device_id", "018910980"),
        ("outbound_config_id", "1c19dc7e-73e2-4af3-93f5-a1cb322e5add"),
        ("integration_id", "36485b4f-88cd-49c4-a723-0ddff1f580c4"),
        ("tracing_context", "{}"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

#[test]
fn absent_version_maps_v1_attributes_onto_routing_fields() {
    let attributes = RoutingAttributes::from_map(&position_attributes()).unwrap();
    assert_eq!(attributes.gundi_version, SchemaVersion::V1);
    assert_eq!(attributes.parsed_stream_type(), Some(StreamType::Position));
    assert_eq!(attributes.external_source_id.as_deref(), Some("018910980"));
    assert_eq!(
        attributes.destination_id.as_ref().map(|id| id.as_str()),
        Some("1c19dc7e-73e2-4af3-93f5-a1cb322e5add")
    );
    assert_eq!(
        attributes.data_provider_id.as_ref().map(|id| id.as_str()),
        Some("36485b4f-88cd-49c4-a723-0ddff1f580c4")
    );
    assert!(!attributes.gundi_id.as_str().is_empty());
    assert!(attributes.extra.is_empty());
}

#[test]
fn v1_attributes_require_observation_type() {
    let mut map = position_attributes();
    map.remove("observation_type");
    assert_eq!(RoutingAttributes::from_map(&map), Err(AttributeError::Missing("observation_type")));
}

#[test]
fn stream_labels_only_parse_under_their_own_version() {
    let mut legacy = position_attributes();
    legacy.insert("observation_type".to_string(), "ev".to_string());
    assert_eq!(RoutingAttributes::from_map(&legacy).unwrap().parsed_stream_type(), None);

    let mut current = event_attributes();
    current.insert("stream_type".to_string(), "ps".to_string());
    assert_eq!(RoutingAttributes::from_map(&current).unwrap().parsed_stream_type(), None);
}

#[test]
fn v1_attributes_render_with_legacy_keys() {
    let mut map = position_attributes();
    map.insert("gundi_id".to_string(), "g-legacy".to_string());
    let rendered = RoutingAttributes::from_map(&map).unwrap().to_map();
    map.insert("gundi_version".to_string(), "v1".to_string());
    assert_eq!(rendered, map);
}

#[test]
fn rendering_writes_none_sentinel_and_keeps_extras() {
    let attributes = RoutingAttributes::from_map(&event_attributes()).unwrap();
    let rendered = attributes.to_map();
    assert_eq!(rendered, event_attributes());
}
