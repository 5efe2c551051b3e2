// crates/gundi-dispatcher-core/src/core/stream.rs
// ============================================================================
// Module: Gundi Dispatcher Stream Types
// Description: Stream-type and schema-version discriminators.
// Purpose: Classify inbound messages before strategy selection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every inbound message names its stream type with a short prefix and its
//! protocol with `gundi_version`. `v2` messages use `ev`, `evu`, `att`, `obv`
//! and `txt`; legacy `v1` messages use `ps`, `ge` and `ct`.
//! Invariants:
//! - Wire labels are stable; parsing is exact and case-sensitive.
//! - A missing `gundi_version` means [`SchemaVersion::V1`].
//! - Every stream type belongs to exactly one schema version.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Stream Type
// ============================================================================

/// Observation kind carried by a message.
///
/// # Invariants
/// - Variants are stable for programmatic handling and map 1:1 to wire labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StreamType {
    /// New event (report).
    #[serde(rename = "ev")]
    Event,
    /// Partial update to a previously delivered event.
    #[serde(rename = "evu")]
    EventUpdate,
    /// File attached to a previously delivered event.
    #[serde(rename = "att")]
    Attachment,
    /// Georeferenced telemetry point.
    #[serde(rename = "obv")]
    Observation,
    /// Free-text message from a device or person.
    #[serde(rename = "txt")]
    TextMessage,
    /// Legacy position report.
    #[serde(rename = "ps")]
    Position,
    /// Legacy geo event (report).
    #[serde(rename = "ge")]
    GeoEvent,
    /// Legacy camera trap report with an image file.
    #[serde(rename = "ct")]
    CameraTrap,
}

impl StreamType {
    /// All stream types, `v2` labels first.
    pub const ALL: [Self; 8] = [
        Self::Event,
        Self::EventUpdate,
        Self::Attachment,
        Self::Observation,
        Self::TextMessage,
        Self::Position,
        Self::GeoEvent,
        Self::CameraTrap,
    ];

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "ev",
            Self::EventUpdate => "evu",
            Self::Attachment => "att",
            Self::Observation => "obv",
            Self::TextMessage => "txt",
            Self::Position => "ps",
            Self::GeoEvent => "ge",
            Self::CameraTrap => "ct",
        }
    }

    /// Returns the protocol version that uses this stream type.
    #[must_use]
    pub const fn schema_version(self) -> SchemaVersion {
        match self {
            Self::Position | Self::GeoEvent | Self::CameraTrap => SchemaVersion::V1,
            Self::Event
            | Self::EventUpdate
            | Self::Attachment
            | Self::Observation
            | Self::TextMessage => SchemaVersion::V2,
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stream| stream.as_str() == label)
    }

    /// Returns true when delivery depends on a prior [`crate::DispatchRecord`].
    #[must_use]
    pub const fn requires_related_record(self) -> bool {
        matches!(self, Self::Attachment | Self::EventUpdate)
    }

    /// Returns true for update streams, which never create a dispatch record.
    #[must_use]
    pub const fn is_update(self) -> bool {
        matches!(self, Self::EventUpdate)
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Schema Version
// ============================================================================

/// Gundi protocol version declared by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Legacy pipeline keyed by `observation_type` and `outbound_config_id`.
    V1,
    /// Current pipeline keyed by `gundi_id` and `stream_type`.
    V2,
}

impl SchemaVersion {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    /// Parses the `gundi_version` attribute; absence means [`Self::V1`].
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("v1") => Some(Self::V1),
            Some("v2") => Some(Self::V2),
            Some(_) => None,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
