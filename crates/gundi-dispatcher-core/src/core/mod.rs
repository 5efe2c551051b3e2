// crates/gundi-dispatcher-core/src/core/mod.rs
// ============================================================================
// Module: Gundi Dispatcher Core Types
// Description: Canonical observation, routing, record, and event structures.
// Purpose: Provide stable, serializable types shared by every dispatcher crate.
// Dependencies: serde, serde_json, time, uuid
// ============================================================================

//! ## Overview
//! Core types describe what arrives on the queue (routing attributes and
//! canonical observations), what the dispatcher remembers (dispatch records),
//! and what it announces (system events). They carry no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod attributes;
pub mod delivery;
pub mod errors;
pub mod events;
pub mod identifiers;
pub mod integration;
pub mod observation;
pub mod record;
pub mod stream;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attributes::AttributeError;
pub use attributes::NULL_SENTINELS;
pub use attributes::RoutingAttributes;
pub use attributes::is_null;
pub use attributes::normalize_related_to;
pub use delivery::Delivery;
pub use delivery::DeliveryError;
pub use delivery::DeliveryOutcome;
pub use delivery::DeliveryReceipt;
pub use errors::DispatchError;
pub use errors::Disposition;
pub use events::ErrorDetails;
pub use events::SystemEvent;
pub use events::SystemEventKind;
pub use events::SystemEventPayload;
pub use events::error_chain;
pub use identifiers::DataProviderId;
pub use identifiers::DestinationId;
pub use identifiers::ExternalId;
pub use identifiers::GundiId;
pub use identifiers::ProviderKey;
pub use integration::AuthActionConfig;
pub use integration::DestinationIntegration;
pub use integration::IntegrationConfiguration;
pub use integration::IntegrationError;
pub use integration::IntegrationType;
pub use integration::PushEndpoints;
pub use observation::AttachmentPayload;
pub use observation::Batch;
pub use observation::CameraTrapPayload;
pub use observation::CanonicalObservation;
pub use observation::EventLocation;
pub use observation::EventPayload;
pub use observation::EventUpdatePayload;
pub use observation::ObservationLocation;
pub use observation::ObservationPayload;
pub use observation::TextMessagePayload;
pub use observation::prune_nulls;
pub use record::DispatchRecord;
pub use record::DispatchTrace;
pub use record::UpdatedObservation;
pub use record::dispatch_record_key;
pub use stream::SchemaVersion;
pub use stream::StreamType;
pub use time::Clock;
pub use time::FixedClock;
pub use time::SystemClock;
pub use time::Timestamp;
