// crates/gundi-dispatcher-broker/src/strategy/mod.rs
// ============================================================================
// Module: Gundi Dispatcher Delivery Strategies
// Description: Per-stream delivery strategies and the strategy registry.
// Purpose: Map each stream type to the destination calls that deliver it.
// Dependencies: async-trait, gundi-dispatcher-core
// ============================================================================

//! ## Overview
//! A [`DeliveryStrategy`] delivers one [`CanonicalObservation`] through a
//! [`DestinationClient`]. The [`StrategyRegistry`] maps stream type labels to
//! strategies and is fixed once built.
//! Invariants:
//! - Batches are delivered in input order and abort on the first failure.
//! - Strategies never touch the delivery cache or publish system events.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod attachment;
pub mod event;
pub mod event_update;
pub mod legacy;
pub mod message;
pub mod observation;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use gundi_dispatcher_core::BlobStore;
use gundi_dispatcher_core::CanonicalObservation;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DeliveryOutcome;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::DispatchError;
use gundi_dispatcher_core::DispatchRecord;
use gundi_dispatcher_core::ExternalId;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::StreamType;
use serde::Serialize;
use serde_json::Value;

pub use self::attachment::AttachmentStrategy;
pub use self::event::EventStrategy;
pub use self::event_update::EventUpdateStrategy;
pub use self::legacy::CameraTrapStrategy;
pub use self::legacy::GeoEventStrategy;
pub use self::legacy::PositionStrategy;
pub use self::message::TextMessageStrategy;
pub use self::observation::ObservationStrategy;

// ============================================================================
// SECTION: Delivery Context
// ============================================================================

/// Per-message inputs a strategy may need besides the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryContext {
    /// Canonical object id being delivered.
    pub gundi_id: GundiId,
    /// Destination id of the event to patch (updates only).
    pub external_id: Option<ExternalId>,
    /// Record of the owning delivery (attachments and updates).
    pub related_record: Option<DispatchRecord>,
    /// Effective provider key.
    pub provider_key: ProviderKey,
    /// Device or manufacturer id from the routing attributes.
    pub external_source_id: Option<String>,
}

impl DeliveryContext {
    /// Creates a context with no related delivery.
    #[must_use]
    pub const fn new(gundi_id: GundiId, provider_key: ProviderKey) -> Self {
        Self {
            gundi_id,
            external_id: None,
            related_record: None,
            provider_key,
            external_source_id: None,
        }
    }

    /// Attaches the owning delivery record and its external id.
    #[must_use]
    pub fn with_related_record(mut self, record: DispatchRecord) -> Self {
        self.external_id = record.external_id.clone();
        self.related_record = Some(record);
        self
    }

    /// Sets the external source id.
    #[must_use]
    pub fn with_external_source_id(mut self, external_source_id: Option<String>) -> Self {
        self.external_source_id = external_source_id;
        self
    }
}

// ============================================================================
// SECTION: Strategy Trait
// ============================================================================

/// Delivers one stream type.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    /// Stream type this strategy handles.
    fn stream_type(&self) -> StreamType;

    /// Delivers the observation through `client`.
    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        context: &DeliveryContext,
    ) -> DeliveryOutcome;
}

/// Error for a payload that does not match the strategy.
pub(crate) fn mismatched_payload(expected: StreamType, actual: &CanonicalObservation) -> DeliveryError {
    DeliveryError::InvalidPayload(format!(
        "expected `{}` payload, got `{}`",
        expected.as_str(),
        actual.stream_type().as_str()
    ))
}

/// Serializes a payload item to a JSON body without null members.
pub(crate) fn json_body<T: Serialize>(item: &T) -> Result<Value, DeliveryError> {
    serde_json::to_value(item)
        .map(gundi_dispatcher_core::prune_nulls)
        .map_err(|err| DeliveryError::InvalidPayload(err.to_string()))
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Builder for a strategy registry.
///
/// # Invariants
/// - Later registrations for the same stream type overwrite earlier ones.
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    /// Strategies keyed by stream type label.
    strategies: BTreeMap<String, Arc<dyn DeliveryStrategy>>,
}

impl StrategyRegistryBuilder {
    /// Registers a strategy under its stream type.
    #[must_use]
    pub fn strategy(mut self, strategy: impl DeliveryStrategy + 'static) -> Self {
        self.strategies.insert(strategy.stream_type().as_str().to_string(), Arc::new(strategy));
        self
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        StrategyRegistry {
            strategies: self.strategies,
        }
    }
}

/// Static map from stream type to strategy.
pub struct StrategyRegistry {
    /// Strategies keyed by stream type label.
    strategies: BTreeMap<String, Arc<dyn DeliveryStrategy>>,
}

impl StrategyRegistry {
    /// Returns a registry builder.
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// Returns a registry with a strategy for every stream type.
    #[must_use]
    pub fn with_defaults(blobs: Arc<dyn BlobStore>) -> Self {
        Self::builder()
            .strategy(EventStrategy)
            .strategy(EventUpdateStrategy)
            .strategy(AttachmentStrategy::new(Arc::clone(&blobs)))
            .strategy(ObservationStrategy)
            .strategy(TextMessageStrategy)
            .strategy(PositionStrategy)
            .strategy(GeoEventStrategy)
            .strategy(CameraTrapStrategy::new(blobs))
            .build()
    }

    /// Resolves the strategy for a stream type label.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedStreamType`] when none is registered.
    pub fn resolve(&self, stream_type: &str) -> Result<Arc<dyn DeliveryStrategy>, DispatchError> {
        self.strategies
            .get(stream_type)
            .map(Arc::clone)
            .ok_or_else(|| DispatchError::UnsupportedStreamType(stream_type.to_string()))
    }

    /// Returns the registered stream type labels.
    #[must_use]
    pub fn stream_types(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }
}
