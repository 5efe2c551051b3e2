// crates/gundi-dispatcher-broker/src/envelope.rs
// ============================================================================
// Module: Gundi Dispatcher Envelope Decoder
// Description: Queue envelope decoding, encoding and staleness checks.
// Purpose: Turn raw queue messages into payloads plus typed routing attributes.
// Dependencies: base64, gundi-dispatcher-core, serde, serde_json, time
// ============================================================================

//! ## Overview
//! Queue messages carry a base64 JSON body and a flat attribute map. The
//! decoder validates both and hands the orchestrator a [`DecodedMessage`].
//! Invariants:
//! - Decoding never mutates the raw attribute map; dead-letters reuse it verbatim.
//! - `v1` and `v2` messages decode onto the same routing model; unknown
//!   versions are rejected.
//! - A missing or unreadable timestamp is never stale.
//!
//! Security posture: message bodies and attributes are untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gundi_dispatcher_core::AttributeError;
use gundi_dispatcher_core::CanonicalObservation;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::RoutingAttributes;
use gundi_dispatcher_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timestamp layout with sub-second precision.
const TIMESTAMP_WITH_FRACTION: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]Z");

/// Timestamp layout with whole seconds.
const TIMESTAMP_WHOLE_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Payload key that overrides the routing provider key.
const PAYLOAD_PROVIDER_KEY: &str = "provider_key";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Envelope decoding errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Body or attributes are unusable.
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// Declared `gundi_version` is unknown.
    #[error("unsupported gundi version: {0}")]
    UnsupportedVersion(String),
    /// Stream type label is unknown.
    #[error("unsupported stream type: {0}")]
    UnsupportedStreamType(String),
}

impl From<AttributeError> for EnvelopeError {
    fn from(err: AttributeError) -> Self {
        match err {
            AttributeError::Missing(_) => Self::Malformed(err.to_string()),
            AttributeError::UnsupportedVersion(version) => Self::UnsupportedVersion(version),
        }
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Raw queue message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    /// Base64-encoded JSON body.
    #[serde(default)]
    pub data: String,
    /// Attribute map; absent attributes make the envelope malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    /// Queue-assigned message id.
    #[serde(default, alias = "message_id", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Queue publish time.
    #[serde(default, alias = "publish_time", skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

/// Push subscription request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// Delivered message.
    pub message: QueueMessage,
    /// Subscription that delivered the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl PushEnvelope {
    /// Parses a push request body.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] when the body is not a push envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(body).map_err(|err| EnvelopeError::Malformed(err.to_string()))
    }
}

// ============================================================================
// SECTION: Decoded Message
// ============================================================================

/// Message after envelope validation.
///
/// # Invariants
/// - `attributes` were parsed from `raw_attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Decoded JSON payload, unwrapped from any transformer envelope.
    pub payload: Value,
    /// Decoded body bytes exactly as received.
    pub data: Vec<u8>,
    /// Typed routing attributes.
    pub attributes: RoutingAttributes,
    /// Attribute map exactly as received.
    pub raw_attributes: BTreeMap<String, String>,
    /// Queue-assigned message id.
    pub message_id: Option<String>,
    /// Queue publish time.
    pub publish_time: Option<String>,
}

impl DecodedMessage {
    /// Removes a payload-level provider key, returning it when present.
    pub fn take_provider_key(&mut self) -> Option<ProviderKey> {
        let Value::Object(map) = &mut self.payload else {
            return None;
        };
        match map.remove(PAYLOAD_PROVIDER_KEY) {
            Some(Value::String(key)) if !key.trim().is_empty() => {
                Some(ProviderKey::new(key.trim()))
            }
            _ => None,
        }
    }

    /// Returns the provider key to deliver with: payload override, else attribute.
    pub fn effective_provider_key(&mut self) -> Option<ProviderKey> {
        self.take_provider_key().or_else(|| self.attributes.provider_key.clone())
    }

    /// Parses the payload into the canonical observation for its stream type.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::UnsupportedStreamType`] for unknown labels and
    /// [`EnvelopeError::Malformed`] when the payload does not fit the stream schema.
    pub fn observation(&self) -> Result<CanonicalObservation, EnvelopeError> {
        let stream_type = self
            .attributes
            .parsed_stream_type()
            .ok_or_else(|| EnvelopeError::UnsupportedStreamType(self.attributes.stream_type.clone()))?;
        CanonicalObservation::from_value(stream_type, self.payload.clone()).map_err(|err| {
            EnvelopeError::Malformed(format!("{} payload: {err}", stream_type.as_str()))
        })
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a queue message.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the body is not base64 JSON, attributes are
/// absent or incomplete, or the version is unknown.
pub fn decode(message: &QueueMessage) -> Result<DecodedMessage, EnvelopeError> {
    let raw_attributes = message
        .attributes
        .clone()
        .filter(|attributes| !attributes.is_empty())
        .ok_or_else(|| EnvelopeError::Malformed("message attributes are missing".to_string()))?;
    let data = STANDARD
        .decode(message.data.trim())
        .map_err(|err| EnvelopeError::Malformed(format!("invalid base64 body: {err}")))?;
    let payload: Value = serde_json::from_slice(&data)
        .map_err(|err| EnvelopeError::Malformed(format!("invalid json body: {err}")))?;
    let attributes = RoutingAttributes::from_map(&raw_attributes)?;
    Ok(DecodedMessage {
        payload: unwrap_transformed(payload),
        data,
        attributes,
        raw_attributes,
        message_id: message.message_id.clone(),
        publish_time: message.publish_time.clone(),
    })
}

/// Unwraps `{event_type: "*Transformed*", payload}` envelopes produced by
/// upstream transformers.
fn unwrap_transformed(payload: Value) -> Value {
    match payload {
        Value::Object(mut map)
            if map
                .get("event_type")
                .and_then(Value::as_str)
                .is_some_and(|label| label.contains("Transformed"))
                && map.contains_key("payload") =>
        {
            map.remove("payload").unwrap_or(Value::Null)
        }
        other => other,
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes an observation and its attributes as a queue message.
///
/// # Errors
///
/// Returns [`EnvelopeError::Malformed`] when the observation cannot be serialized.
pub fn encode(
    observation: &CanonicalObservation,
    attributes: &RoutingAttributes,
) -> Result<QueueMessage, EnvelopeError> {
    let payload = observation.to_value().map_err(|err| EnvelopeError::Malformed(err.to_string()))?;
    let body = serde_json::to_vec(&payload).map_err(|err| EnvelopeError::Malformed(err.to_string()))?;
    Ok(QueueMessage {
        data: STANDARD.encode(body),
        attributes: Some(attributes.to_map()),
        message_id: None,
        publish_time: None,
    })
}

// ============================================================================
// SECTION: Staleness
// ============================================================================

/// Parses a message timestamp in either accepted layout.
#[must_use]
pub fn parse_message_time(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    PrimitiveDateTime::parse(value, TIMESTAMP_WITH_FRACTION)
        .or_else(|_| PrimitiveDateTime::parse(value, TIMESTAMP_WHOLE_SECONDS))
        .ok()
        .map(|parsed| Timestamp::new(parsed.assume_utc()))
}

/// Returns true when the message is older than `max_age` at `now`.
///
/// A message exactly `max_age` old is not stale.
#[must_use]
pub fn is_too_old(timestamp: Option<&str>, now: Timestamp, max_age: Duration) -> bool {
    let Some(raw) = timestamp else {
        tracing::warn!("message has no timestamp; treating it as fresh");
        return false;
    };
    let Some(sent_at) = parse_message_time(raw) else {
        tracing::warn!(timestamp = raw, "message timestamp is unreadable; treating it as fresh");
        return false;
    };
    let limit = time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX);
    sent_at.age_at(now) > limit
}

// ============================================================================
// SECTION: Tests
// ============================================================================
