// crates/gundi-dispatcher-core/src/core/events.rs
// ============================================================================
// Module: Gundi Dispatcher System Events
// Description: Outcome notifications published for other Gundi services.
// Purpose: Serialize delivered / failed / updated notifications with a stable shape.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! System events tell the portal and other services what happened to a
//! message. Every event is wrapped in the same envelope:
//! `{event_id, timestamp, schema_version, event_type, payload}`.
//! Invariants:
//! - `event_id` is a fresh UUID v4 per event.
//! - Failure events carry the destination status and body verbatim.
//! - Failure events use schema version `v2`; success events use `v1`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;
use std::fmt::Write as _;

use serde::Serialize;
use uuid::Uuid;

use crate::core::delivery::DeliveryError;
use crate::core::record::DispatchRecord;
use crate::core::record::UpdatedObservation;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event Kinds
// ============================================================================

/// System event type.
///
/// # Invariants
/// - Variants are stable and serialize as their Rust names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SystemEventKind {
    /// Observation delivered and recorded.
    ObservationDelivered,
    /// Observation delivery failed.
    ObservationDeliveryFailed,
    /// Event update applied.
    ObservationUpdated,
    /// Event update failed.
    ObservationUpdateFailed,
}

impl SystemEventKind {
    /// Returns the event type label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ObservationDelivered => "ObservationDelivered",
            Self::ObservationDeliveryFailed => "ObservationDeliveryFailed",
            Self::ObservationUpdated => "ObservationUpdated",
            Self::ObservationUpdateFailed => "ObservationUpdateFailed",
        }
    }

    /// Returns the payload schema version for this kind.
    #[must_use]
    pub const fn schema_version(self) -> &'static str {
        match self {
            Self::ObservationDelivered | Self::ObservationUpdated => "v1",
            Self::ObservationDeliveryFailed | Self::ObservationUpdateFailed => "v2",
        }
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Failure details shared by both failure events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails<T> {
    /// Error kind and message.
    pub error: String,
    /// Rendered error source chain.
    pub error_traceback: String,
    /// Destination HTTP status, when one was received.
    pub server_response_status: Option<u16>,
    /// Destination response body, empty when none was received.
    pub server_response_body: String,
    /// Observation the failure applies to.
    pub observation: T,
}

impl<T> ErrorDetails<T> {
    /// Builds failure details from a delivery error.
    #[must_use]
    pub fn from_delivery_error(err: &DeliveryError, observation: T) -> Self {
        Self {
            error: format!("{}: {err}", err.kind()),
            error_traceback: error_chain(err),
            server_response_status: err.status_code(),
            server_response_body: err.response_body().unwrap_or_default().to_string(),
            observation,
        }
    }
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SystemEventPayload {
    /// Delivered record.
    Delivered(DispatchRecord),
    /// Delivery failure.
    DeliveryFailed(ErrorDetails<DispatchRecord>),
    /// Update applied.
    Updated(UpdatedObservation),
    /// Update failure.
    UpdateFailed(ErrorDetails<UpdatedObservation>),
}

// ============================================================================
// SECTION: System Event
// ============================================================================

/// Envelope published to the dispatcher events topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemEvent {
    /// Unique event id.
    pub event_id: Uuid,
    /// Emission time.
    pub timestamp: Timestamp,
    /// Payload schema version.
    pub schema_version: &'static str,
    /// Event payload.
    pub payload: SystemEventPayload,
    /// Event type.
    pub event_type: SystemEventKind,
}

impl SystemEvent {
    /// Wraps a payload with a fresh id.
    fn new(kind: SystemEventKind, payload: SystemEventPayload, now: Timestamp) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: now,
            schema_version: kind.schema_version(),
            payload,
            event_type: kind,
        }
    }

    /// Builds an `ObservationDelivered` event.
    #[must_use]
    pub fn observation_delivered(record: DispatchRecord, now: Timestamp) -> Self {
        Self::new(
            SystemEventKind::ObservationDelivered,
            SystemEventPayload::Delivered(record),
            now,
        )
    }

    /// Builds an `ObservationDeliveryFailed` event.
    #[must_use]
    pub fn observation_delivery_failed(
        details: ErrorDetails<DispatchRecord>,
        now: Timestamp,
    ) -> Self {
        Self::new(
            SystemEventKind::ObservationDeliveryFailed,
            SystemEventPayload::DeliveryFailed(details),
            now,
        )
    }

    /// Builds an `ObservationUpdated` event.
    #[must_use]
    pub fn observation_updated(update: UpdatedObservation, now: Timestamp) -> Self {
        Self::new(SystemEventKind::ObservationUpdated, SystemEventPayload::Updated(update), now)
    }

    /// Builds an `ObservationUpdateFailed` event.
    #[must_use]
    pub fn observation_update_failed(
        details: ErrorDetails<UpdatedObservation>,
        now: Timestamp,
    ) -> Self {
        Self::new(
            SystemEventKind::ObservationUpdateFailed,
            SystemEventPayload::UpdateFailed(details),
            now,
        )
    }

    /// Serializes the event to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders an error and its source chain, one cause per line.
#[must_use]
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(rendered, "\nCaused by: {cause}");
        source = cause.source();
    }
    rendered
}
