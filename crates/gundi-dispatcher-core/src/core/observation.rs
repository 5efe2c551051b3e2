// crates/gundi-dispatcher-core/src/core/observation.rs
// ============================================================================
// Module: Gundi Dispatcher Canonical Observations
// Description: Destination-agnostic payload model for each stream type.
// Purpose: Give strategies typed payloads instead of free-form JSON.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`CanonicalObservation`] is the already-transformed payload produced by
//! the upstream transformation stage. Each variant wraps a [`Batch`] so a
//! message body may hold a single object or a homogeneous list.
//! Legacy `v1` positions and geo events reuse the observation and event
//! payloads; camera trap reports have their own shape.
//! Invariants:
//! - Observations are immutable once constructed.
//! - A list payload holds at least one item.
//! - Unset optional fields are omitted on serialization.
//! - Fields the model does not name are preserved through `extra` maps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::de::Error as _;
use serde_json::Map;
use serde_json::Value;

use crate::core::stream::StreamType;

// ============================================================================
// SECTION: Batch
// ============================================================================

/// Single payload or homogeneous list of payloads.
///
/// # Invariants
/// - `Many` preserves input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Batch<T> {
    /// List payload.
    Many(Vec<T>),
    /// Single payload.
    One(T),
}

impl<T> Batch<T> {
    /// Returns the items in input order.
    #[must_use]
    pub fn items(&self) -> Vec<&T> {
        match self {
            Self::Many(items) => items.iter().collect(),
            Self::One(item) => vec![item],
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Many(items) => items.len(),
            Self::One(_) => 1,
        }
    }

    /// Returns true when a list payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true when the payload arrived as a list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

// ============================================================================
// SECTION: Locations
// ============================================================================

/// Event location using the destination's long-form keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Telemetry location using short-form keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationLocation {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

// ============================================================================
// SECTION: Payload Types
// ============================================================================

/// Event (report) payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventPayload {
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Destination event type slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Event time as produced upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Event location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EventLocation>,
    /// Type-specific details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_details: Option<Map<String, Value>>,
    /// Priority on the destination scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Event state (for example `active`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Additional fields passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update to a delivered event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventUpdatePayload {
    /// Fields to change on the destination event.
    pub changes: Map<String, Value>,
    /// Additional fields; never sent to the destination.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Attachment referencing a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttachmentPayload {
    /// Blob-store path of the file.
    pub file_path: String,
}

/// Telemetry observation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPayload {
    /// Device or manufacturer id.
    pub manufacturer_id: String,
    /// Source type (for example `tracking-device`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Subject display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// Subject type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
    /// Subject subtype.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_subtype: Option<String>,
    /// Recording time as produced upstream.
    pub recorded_at: String,
    /// Position.
    pub location: ObservationLocation,
    /// Free-form sensor readings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<Map<String, Value>>,
    /// Additional fields passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inbound text message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessagePayload {
    /// Sender (device or person) id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Receiver id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Message kind (for example `inbox`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Message body.
    pub text: String,
    /// Message time as produced upstream.
    pub message_time: String,
    /// Sender position when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_location: Option<EventLocation>,
    /// Device status readings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Map<String, Value>>,
    /// Additional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<Map<String, Value>>,
}

/// Legacy camera trap report referencing a stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraTrapPayload {
    /// Blob-store path of the image.
    pub file: String,
    /// Camera display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,
    /// Camera description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_description: Option<String>,
    /// Capture time as produced upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Camera location; upstream sends either an object or a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// Additional fields passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// SECTION: Canonical Observation
// ============================================================================

/// Destination-agnostic payload, one variant per stream type.
///
/// # Invariants
/// - The variant always matches the message's stream type.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalObservation {
    /// New event.
    Event(Batch<EventPayload>),
    /// Event patch.
    EventUpdate(Batch<EventUpdatePayload>),
    /// Event attachment.
    Attachment(Batch<AttachmentPayload>),
    /// Telemetry point.
    Observation(Batch<ObservationPayload>),
    /// Text message.
    TextMessage(Batch<TextMessagePayload>),
    /// Legacy position.
    Position(Batch<ObservationPayload>),
    /// Legacy geo event.
    GeoEvent(Batch<EventPayload>),
    /// Legacy camera trap report.
    CameraTrap(Batch<CameraTrapPayload>),
}

impl CanonicalObservation {
    /// Parses a JSON payload for the given stream type.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the payload does not match the schema
    /// or is an empty list.
    pub fn from_value(stream_type: StreamType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match stream_type {
            StreamType::Event => Self::Event(parse_batch(value)?),
            StreamType::EventUpdate => Self::EventUpdate(parse_batch(value)?),
            StreamType::Attachment => Self::Attachment(parse_batch(value)?),
            StreamType::Observation => Self::Observation(parse_batch(value)?),
            StreamType::TextMessage => Self::TextMessage(parse_batch(value)?),
            StreamType::Position => Self::Position(parse_batch(value)?),
            StreamType::GeoEvent => Self::GeoEvent(parse_batch(value)?),
            StreamType::CameraTrap => Self::CameraTrap(parse_batch(value)?),
        })
    }

    /// Serializes the payload back to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Event(batch) => serde_json::to_value(batch),
            Self::EventUpdate(batch) => serde_json::to_value(batch),
            Self::Attachment(batch) => serde_json::to_value(batch),
            Self::Observation(batch) => serde_json::to_value(batch),
            Self::TextMessage(batch) => serde_json::to_value(batch),
            Self::Position(batch) => serde_json::to_value(batch),
            Self::GeoEvent(batch) => serde_json::to_value(batch),
            Self::CameraTrap(batch) => serde_json::to_value(batch),
        }
    }

    /// Returns the stream type of the variant.
    #[must_use]
    pub const fn stream_type(&self) -> StreamType {
        match self {
            Self::Event(_) => StreamType::Event,
            Self::EventUpdate(_) => StreamType::EventUpdate,
            Self::Attachment(_) => StreamType::Attachment,
            Self::Observation(_) => StreamType::Observation,
            Self::TextMessage(_) => StreamType::TextMessage,
            Self::Position(_) => StreamType::Position,
            Self::GeoEvent(_) => StreamType::GeoEvent,
            Self::CameraTrap(_) => StreamType::CameraTrap,
        }
    }
}

/// Parses a batch, rejecting an empty list.
fn parse_batch<T: DeserializeOwned>(value: Value) -> Result<Batch<T>, serde_json::Error> {
    let batch: Batch<T> = serde_json::from_value(value)?;
    if batch.is_empty() {
        return Err(serde_json::Error::custom("payload list is empty"));
    }
    Ok(batch)
}

// ============================================================================
// SECTION: JSON Helpers
// ============================================================================

/// Removes `null` members from objects, recursively.
///
/// Array elements are kept as-is apart from recursing into nested objects.
#[must_use]
pub fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (key, prune_nulls(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune_nulls).collect()),
        other => other,
    }
}
