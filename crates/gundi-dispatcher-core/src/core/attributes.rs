// crates/gundi-dispatcher-core/src/core/attributes.rs
// ============================================================================
// Module: Gundi Dispatcher Routing Attributes
// Description: Typed view over the flat attribute map of a queue message.
// Purpose: Normalize routing metadata once, at the decoding boundary.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Queue messages carry routing metadata as a flat string map. This module
//! parses that map into [`RoutingAttributes`] and renders it back.
//! Legacy `v1` maps name their routing fields differently and are mapped onto
//! the same model: `observation_type` is the stream type,
//! `outbound_config_id` the destination, `integration_id` the data provider
//! and `device_id` the external source.
//! Invariants:
//! - `v2` maps require `gundi_id`; `v1` maps require `observation_type` and
//!   mint a `gundi_id` when none is given.
//! - Every other routing field is optional here and enforced by the orchestrator.
//! - `related_to` values `""`, `"None"` and `"null"` normalize to no relation.
//! - Unrecognized attributes are preserved in [`RoutingAttributes::extra`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::DataProviderId;
use crate::core::identifiers::DestinationId;
use crate::core::identifiers::GundiId;
use crate::core::identifiers::ProviderKey;
use crate::core::stream::SchemaVersion;
use crate::core::stream::StreamType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attribute names understood by the dispatcher.
pub mod keys {
    /// Protocol version.
    pub const GUNDI_VERSION: &str = "gundi_version";
    /// Canonical object id.
    pub const GUNDI_ID: &str = "gundi_id";
    /// Related object id.
    pub const RELATED_TO: &str = "related_to";
    /// Stream type label.
    pub const STREAM_TYPE: &str = "stream_type";
    /// Source id in Gundi.
    pub const SOURCE_ID: &str = "source_id";
    /// Source id in the originating system.
    pub const EXTERNAL_SOURCE_ID: &str = "external_source_id";
    /// Destination integration id.
    pub const DESTINATION_ID: &str = "destination_id";
    /// Data provider integration id.
    pub const DATA_PROVIDER_ID: &str = "data_provider_id";
    /// Provider key for the destination.
    pub const PROVIDER_KEY: &str = "provider_key";
    /// Serialized tracing context.
    pub const TRACING_CONTEXT: &str = "tracing_context";
    /// Legacy stream type label.
    pub const OBSERVATION_TYPE: &str = "observation_type";
    /// Legacy destination configuration id.
    pub const OUTBOUND_CONFIG_ID: &str = "outbound_config_id";
    /// Legacy data provider integration id.
    pub const INTEGRATION_ID: &str = "integration_id";
    /// Legacy device id.
    pub const DEVICE_ID: &str = "device_id";
}

/// String values treated as null by upstream producers.
pub const NULL_SENTINELS: [&str; 3] = ["", "None", "null"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while parsing routing attributes.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// A required attribute is absent or null.
    #[error("missing required attribute: {0}")]
    Missing(&'static str),
    /// `gundi_version` holds an unknown value.
    #[error("unsupported gundi_version: {0}")]
    UnsupportedVersion(String),
}

// ============================================================================
// SECTION: Null Handling
// ============================================================================

/// Returns true when the value is absent or one of [`NULL_SENTINELS`].
#[must_use]
pub fn is_null(value: Option<&str>) -> bool {
    value.is_none_or(|text| NULL_SENTINELS.contains(&text))
}

/// Normalizes a raw `related_to` attribute into an optional reference.
#[must_use]
pub fn normalize_related_to(value: Option<&str>) -> Option<GundiId> {
    if is_null(value) { None } else { value.map(GundiId::new) }
}

/// Returns the trimmed value when it is non-empty.
fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|text| text.trim()).filter(|text| !text.is_empty()).map(str::to_string)
}

/// Returns the `gundi_id` attribute unless it is absent or a null sentinel.
fn non_null_id(map: &BTreeMap<String, String>) -> Option<GundiId> {
    map.get(keys::GUNDI_ID)
        .filter(|value| !is_null(Some(value.as_str())))
        .map(|value| GundiId::new(value.trim()))
}

/// Collects attributes whose keys are not in `known`.
fn unknown_attributes(map: &BTreeMap<String, String>, known: &[&str]) -> BTreeMap<String, String> {
    map.iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// ============================================================================
// SECTION: Routing Attributes
// ============================================================================

/// Typed routing metadata accompanying a message payload.
///
/// # Invariants
/// - Constructed once per message and never mutated by dispatch code.
/// - `stream_type` keeps the raw label so unknown types reach the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingAttributes {
    /// Declared protocol version.
    pub gundi_version: SchemaVersion,
    /// Canonical object id.
    pub gundi_id: GundiId,
    /// Prior object this one relates to, already normalized.
    pub related_to: Option<GundiId>,
    /// Raw stream type label.
    pub stream_type: String,
    /// Source id in Gundi.
    pub source_id: Option<String>,
    /// Source id in the originating system (device or manufacturer id).
    pub external_source_id: Option<String>,
    /// Destination integration id.
    pub destination_id: Option<DestinationId>,
    /// Data provider integration id.
    pub data_provider_id: Option<DataProviderId>,
    /// Provider key from the attribute map.
    pub provider_key: Option<ProviderKey>,
    /// Serialized tracing context.
    pub tracing_context: Option<String>,
    /// Attributes the dispatcher does not interpret.
    pub extra: BTreeMap<String, String>,
}

impl RoutingAttributes {
    /// Creates attributes for the given object, stream and destination.
    #[must_use]
    pub fn new(gundi_id: GundiId, stream_type: StreamType, destination_id: DestinationId) -> Self {
        Self {
            gundi_version: SchemaVersion::V2,
            gundi_id,
            related_to: None,
            stream_type: stream_type.as_str().to_string(),
            source_id: None,
            external_source_id: None,
            destination_id: Some(destination_id),
            data_provider_id: None,
            provider_key: None,
            tracing_context: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the related object reference.
    #[must_use]
    pub fn with_related_to(mut self, related_to: GundiId) -> Self {
        self.related_to = Some(related_to);
        self
    }

    /// Sets the provider key.
    #[must_use]
    pub fn with_provider_key(mut self, provider_key: ProviderKey) -> Self {
        self.provider_key = Some(provider_key);
        self
    }

    /// Sets the data provider id.
    #[must_use]
    pub fn with_data_provider(mut self, data_provider_id: DataProviderId) -> Self {
        self.data_provider_id = Some(data_provider_id);
        self
    }

    /// Sets the external source id.
    #[must_use]
    pub fn with_external_source_id(mut self, external_source_id: impl Into<String>) -> Self {
        self.external_source_id = Some(external_source_id.into());
        self
    }

    /// Parses attributes from the raw queue map.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError`] when the version is unknown or a required
    /// attribute of that version is missing.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, AttributeError> {
        let version_raw = map.get(keys::GUNDI_VERSION).map(String::as_str);
        let gundi_version = SchemaVersion::from_attribute(version_raw)
            .ok_or_else(|| AttributeError::UnsupportedVersion(version_raw.unwrap_or_default().to_string()))?;
        match gundi_version {
            SchemaVersion::V2 => Self::from_v2_map(map),
            SchemaVersion::V1 => Self::from_v1_map(map),
        }
    }

    /// Parses a `v2` attribute map.
    fn from_v2_map(map: &BTreeMap<String, String>) -> Result<Self, AttributeError> {
        let gundi_id = non_null_id(map).ok_or(AttributeError::Missing(keys::GUNDI_ID))?;
        let known = [
            keys::GUNDI_VERSION,
            keys::GUNDI_ID,
            keys::RELATED_TO,
            keys::STREAM_TYPE,
            keys::SOURCE_ID,
            keys::EXTERNAL_SOURCE_ID,
            keys::DESTINATION_ID,
            keys::DATA_PROVIDER_ID,
            keys::PROVIDER_KEY,
            keys::TRACING_CONTEXT,
        ];
        Ok(Self {
            gundi_version: SchemaVersion::V2,
            gundi_id,
            related_to: normalize_related_to(map.get(keys::RELATED_TO).map(String::as_str)),
            stream_type: map.get(keys::STREAM_TYPE).cloned().unwrap_or_default(),
            source_id: non_empty(map.get(keys::SOURCE_ID)),
            external_source_id: non_empty(map.get(keys::EXTERNAL_SOURCE_ID)),
            destination_id: non_empty(map.get(keys::DESTINATION_ID)).map(DestinationId::new),
            data_provider_id: non_empty(map.get(keys::DATA_PROVIDER_ID)).map(DataProviderId::new),
            provider_key: non_empty(map.get(keys::PROVIDER_KEY)).map(ProviderKey::new),
            tracing_context: non_empty(map.get(keys::TRACING_CONTEXT)),
            extra: unknown_attributes(map, &known),
        })
    }

    /// Parses a legacy `v1` attribute map onto the shared model.
    fn from_v1_map(map: &BTreeMap<String, String>) -> Result<Self, AttributeError> {
        let stream_type =
            non_empty(map.get(keys::OBSERVATION_TYPE)).ok_or(AttributeError::Missing(keys::OBSERVATION_TYPE))?;
        let known = [
            keys::GUNDI_VERSION,
            keys::GUNDI_ID,
            keys::OBSERVATION_TYPE,
            keys::OUTBOUND_CONFIG_ID,
            keys::INTEGRATION_ID,
            keys::DEVICE_ID,
            keys::PROVIDER_KEY,
            keys::TRACING_CONTEXT,
        ];
        Ok(Self {
            gundi_version: SchemaVersion::V1,
            gundi_id: non_null_id(map).unwrap_or_else(GundiId::generate),
            related_to: None,
            stream_type,
            source_id: None,
            external_source_id: non_empty(map.get(keys::DEVICE_ID)),
            destination_id: non_empty(map.get(keys::OUTBOUND_CONFIG_ID)).map(DestinationId::new),
            data_provider_id: non_empty(map.get(keys::INTEGRATION_ID)).map(DataProviderId::new),
            provider_key: non_empty(map.get(keys::PROVIDER_KEY)).map(ProviderKey::new),
            tracing_context: non_empty(map.get(keys::TRACING_CONTEXT)),
            extra: unknown_attributes(map, &known),
        })
    }

    /// Renders attributes back into a queue map using the keys of their version.
    ///
    /// A missing `related_to` is written as the `"None"` sentinel on `v2` maps.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();
        map.insert(keys::GUNDI_VERSION.to_string(), self.gundi_version.as_str().to_string());
        map.insert(keys::GUNDI_ID.to_string(), self.gundi_id.to_string());
        let optional = match self.gundi_version {
            SchemaVersion::V2 => {
                map.insert(
                    keys::RELATED_TO.to_string(),
                    self.related_to.as_ref().map_or_else(|| "None".to_string(), ToString::to_string),
                );
                map.insert(keys::STREAM_TYPE.to_string(), self.stream_type.clone());
                vec![
                    (keys::SOURCE_ID, self.source_id.clone()),
                    (keys::EXTERNAL_SOURCE_ID, self.external_source_id.clone()),
                    (keys::DESTINATION_ID, self.destination_id.as_ref().map(ToString::to_string)),
                    (keys::DATA_PROVIDER_ID, self.data_provider_id.as_ref().map(ToString::to_string)),
                ]
            }
            SchemaVersion::V1 => {
                map.insert(keys::OBSERVATION_TYPE.to_string(), self.stream_type.clone());
                vec![
                    (keys::DEVICE_ID, self.external_source_id.clone()),
                    (keys::OUTBOUND_CONFIG_ID, self.destination_id.as_ref().map(ToString::to_string)),
                    (keys::INTEGRATION_ID, self.data_provider_id.as_ref().map(ToString::to_string)),
                ]
            }
        };
        let shared = [
            (keys::PROVIDER_KEY, self.provider_key.as_ref().map(ToString::to_string)),
            (keys::TRACING_CONTEXT, self.tracing_context.clone()),
        ];
        for (key, value) in optional.into_iter().chain(shared) {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        map
    }

    /// Returns the parsed stream type, when the label is known for this version.
    #[must_use]
    pub fn parsed_stream_type(&self) -> Option<StreamType> {
        StreamType::parse(&self.stream_type).filter(|stream| stream.schema_version() == self.gundi_version)
    }

    /// Returns the id whose dispatch record a dependent message relies on.
    #[must_use]
    pub fn related_lookup_id(&self) -> &GundiId {
        self.related_to.as_ref().unwrap_or(&self.gundi_id)
    }
}
