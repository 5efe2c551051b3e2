// crates/gundi-dispatcher-core/src/core/record.rs
// ============================================================================
// Module: Gundi Dispatcher Dispatch Records
// Description: Idempotency records linking Gundi ids to destination ids.
// Purpose: Let updates and attachments find the destination object they target.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DispatchRecord`] is written once per successful non-update delivery and
//! read back by dependent messages. The portal trace service is authoritative;
//! the cache copy is rebuilt from a [`DispatchTrace`] on miss.
//! Invariants:
//! - A record exists only after the destination confirmed the delivery.
//! - Cache keys follow `dispatched_observation.{gundi_id}.{destination_id}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DataProviderId;
use crate::core::identifiers::DestinationId;
use crate::core::identifiers::ExternalId;
use crate::core::identifiers::GundiId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache key prefix for dispatch records.
pub const DISPATCH_RECORD_KEY_PREFIX: &str = "dispatched_observation";

/// Returns the cache key for a `(gundi_id, destination_id)` pair.
#[must_use]
pub fn dispatch_record_key(gundi_id: &GundiId, destination_id: &DestinationId) -> String {
    format!("{DISPATCH_RECORD_KEY_PREFIX}.{gundi_id}.{destination_id}")
}

// ============================================================================
// SECTION: Dispatch Record
// ============================================================================

/// Record of a delivered observation.
///
/// # Invariants
/// - Written once per key; expiry is TTL-driven.
/// - `external_id` is `None` only when the destination did not echo an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Canonical object id.
    pub gundi_id: GundiId,
    /// Related object id.
    pub related_to: Option<GundiId>,
    /// Id assigned by the destination.
    pub external_id: Option<ExternalId>,
    /// Data provider id.
    pub data_provider_id: Option<DataProviderId>,
    /// Destination id.
    pub destination_id: DestinationId,
    /// Delivery time.
    pub delivered_at: Timestamp,
}

impl DispatchRecord {
    /// Returns this record's cache key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        dispatch_record_key(&self.gundi_id, &self.destination_id)
    }
}

/// Update notification body for a patched event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedObservation {
    /// Canonical object id.
    pub gundi_id: GundiId,
    /// Related object id.
    pub related_to: Option<GundiId>,
    /// Data provider id.
    pub data_provider_id: Option<DataProviderId>,
    /// Destination id.
    pub destination_id: DestinationId,
    /// Update time.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Portal Traces
// ============================================================================

/// Delivery trace as stored by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTrace {
    /// Canonical object id.
    pub object_id: GundiId,
    /// Related object id (may be a null sentinel).
    #[serde(default)]
    pub related_to: Option<String>,
    /// Destination id.
    #[serde(default)]
    pub destination: Option<DestinationId>,
    /// Data provider id.
    #[serde(default)]
    pub data_provider: Option<DataProviderId>,
    /// Id assigned by the destination.
    #[serde(default)]
    pub external_id: Option<ExternalId>,
    /// Delivery time.
    #[serde(default)]
    pub delivered_at: Option<Timestamp>,
}

impl DispatchTrace {
    /// Rebuilds a dispatch record from the trace.
    ///
    /// `fallback_destination` and `fallback_time` fill fields the trace omits.
    #[must_use]
    pub fn into_record(
        self,
        fallback_destination: &DestinationId,
        fallback_time: Timestamp,
    ) -> DispatchRecord {
        DispatchRecord {
            gundi_id: self.object_id,
            related_to: crate::core::attributes::normalize_related_to(self.related_to.as_deref()),
            external_id: self.external_id,
            data_provider_id: self.data_provider,
            destination_id: self.destination.unwrap_or_else(|| fallback_destination.clone()),
            delivered_at: self.delivered_at.unwrap_or(fallback_time),
        }
    }
}
