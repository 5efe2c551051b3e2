// crates/gundi-dispatcher-broker/src/orchestrator.rs
// ============================================================================
// Module: Gundi Dispatcher Orchestrator
// Description: Per-message dispatch state machine.
// Purpose: Resolve reference data, run the delivery strategy, record and announce the outcome.
// Dependencies: gundi-dispatcher-core, tracing
// ============================================================================

//! ## Overview
//! [`Dispatcher::dispatch`] takes one decoded message through destination
//! resolution, related-record lookup, strategy selection and delivery, then
//! records the outcome and publishes a system event.
//! Legacy `v1` messages share the pipeline but, like their producers expect,
//! leave no dispatch record and publish no system events.
//! Invariants:
//! - A dispatch record is written only after the destination confirmed success.
//! - Updates and `v1` deliveries never write a dispatch record.
//! - A delivery without receipts is an internal error and records nothing.
//! - Failure events are published before [`DispatchError::Delivery`] is returned.
//! - Missing reference data never reaches the destination and publishes no event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use gundi_dispatcher_core::Clock;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationConnector;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DispatchError;
use gundi_dispatcher_core::DispatchRecord;
use gundi_dispatcher_core::ErrorDetails;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::RoutingAttributes;
use gundi_dispatcher_core::SchemaVersion;
use gundi_dispatcher_core::StreamType;
use gundi_dispatcher_core::SystemEvent;
use gundi_dispatcher_core::UpdatedObservation;
use tracing::Instrument;

use crate::delivery_cache::DeliveryCache;
use crate::envelope::DecodedMessage;
use crate::envelope::EnvelopeError;
use crate::integrations::IntegrationResolver;
use crate::publisher::SystemEventPublisher;
use crate::strategy::DeliveryContext;
use crate::strategy::StrategyRegistry;

// ============================================================================
// SECTION: Dispatch Summary
// ============================================================================

/// Successful dispatch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchSummary {
    /// New object delivered and recorded.
    Delivered(DispatchRecord),
    /// Existing event updated.
    Updated(UpdatedObservation),
    /// Legacy `v1` message delivered; nothing is recorded.
    Forwarded {
        /// Id the message was dispatched under.
        gundi_id: GundiId,
        /// Destination that accepted it.
        destination_id: DestinationId,
    },
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Dispatch orchestrator.
pub struct Dispatcher {
    /// Cached destination integration lookups.
    integrations: IntegrationResolver,
    /// Dispatch record store.
    records: DeliveryCache,
    /// Stream type to strategy map.
    registry: StrategyRegistry,
    /// Destination client factory.
    connector: Arc<dyn DestinationConnector>,
    /// Outcome notifications.
    events: SystemEventPublisher,
    /// Time source for records and events.
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    /// Creates a dispatcher from its collaborators.
    #[must_use]
    pub fn new(
        integrations: IntegrationResolver,
        records: DeliveryCache,
        registry: StrategyRegistry,
        connector: Arc<dyn DestinationConnector>,
        events: SystemEventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            integrations,
            records,
            registry,
            connector,
            events,
            clock,
        }
    }

    /// Returns the dispatch record store.
    #[must_use]
    pub const fn records(&self) -> &DeliveryCache {
        &self.records
    }

    /// Dispatches one decoded message.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`]; its [`DispatchError::disposition`] tells the
    /// queue binding whether to retry, dead-letter or reject.
    pub async fn dispatch(&self, message: DecodedMessage) -> Result<DispatchSummary, DispatchError> {
        let span = tracing::info_span!(
            "dispatcher.dispatch_observation",
            gundi_id = %message.attributes.gundi_id,
            stream_type = message.attributes.stream_type.as_str(),
            destination_id = message.attributes.destination_id.as_ref().map(|id| id.as_str()),
        );
        self.dispatch_inner(message).instrument(span).await
    }

    /// Runs the dispatch state machine.
    async fn dispatch_inner(
        &self,
        mut message: DecodedMessage,
    ) -> Result<DispatchSummary, DispatchError> {
        let attributes = message.attributes.clone();
        let provider_key = match message.effective_provider_key() {
            Some(key) => Some(key),
            None => self.legacy_provider_key(&attributes).await?,
        };
        let (Some(destination_id), Some(provider_key)) =
            (attributes.destination_id.clone(), provider_key)
        else {
            tracing::error!(attention_needed = true, "destination_id or provider_key is missing");
            return Err(DispatchError::ReferenceData(format!(
                "destination_id or provider_key missing for {}",
                attributes.gundi_id
            )));
        };

        let integration = self
            .integrations
            .resolve(&destination_id)
            .await
            .map_err(|err| {
                tracing::error!(attention_needed = true, error = %err, "integration lookup failed");
                DispatchError::ReferenceData(format!(
                    "error getting integration details for {destination_id}: {err}"
                ))
            })?
            .ok_or_else(|| {
                tracing::error!(attention_needed = true, "integration details not found");
                DispatchError::ReferenceData(format!(
                    "integration details not found for {destination_id}"
                ))
            })?;

        let stream_type = attributes.parsed_stream_type();
        let mut context = DeliveryContext::new(attributes.gundi_id.clone(), provider_key.clone())
            .with_external_source_id(attributes.external_source_id.clone());
        if stream_type.is_some_and(StreamType::requires_related_record) {
            let related = self.related_record(&attributes, &destination_id).await?;
            context = context.with_related_record(related);
        }

        let strategy = self.registry.resolve(&attributes.stream_type).inspect_err(|_| {
            tracing::error!(attention_needed = true, "no delivery strategy for stream type");
        })?;
        let observation = message.observation().map_err(|err| match err {
            EnvelopeError::UnsupportedStreamType(label) => DispatchError::UnsupportedStreamType(label),
            other => DispatchError::Internal(other.to_string()),
        })?;

        tracing::info!(provider_key = %provider_key, "dispatching observation");
        let outcome = match self.connector.connect(&integration, &provider_key) {
            Ok(client) => strategy.deliver(&observation, client.as_ref(), &context).await,
            Err(err) => Err(err),
        };
        let is_update = stream_type.is_some_and(StreamType::is_update);
        let is_legacy = attributes.gundi_version == SchemaVersion::V1;
        match outcome {
            Ok(_) if is_update => {
                let update = self.updated_observation(&attributes, destination_id);
                self.events
                    .publish(&SystemEvent::observation_updated(update.clone(), self.clock.now()))
                    .await?;
                tracing::info!("event update delivered");
                Ok(DispatchSummary::Updated(update))
            }
            Ok(delivery) if delivery.receipts.is_empty() => {
                tracing::error!(attention_needed = true, "delivery produced no receipts");
                Err(DispatchError::Internal(format!(
                    "delivery of {} produced no receipts",
                    attributes.gundi_id
                )))
            }
            Ok(delivery) if is_legacy => {
                tracing::info!(
                    external_id = delivery.primary_external_id().map(|id| id.as_str()),
                    "legacy observation delivered",
                );
                Ok(DispatchSummary::Forwarded {
                    gundi_id: attributes.gundi_id,
                    destination_id,
                })
            }
            Ok(delivery) => {
                let record = DispatchRecord {
                    gundi_id: attributes.gundi_id.clone(),
                    related_to: attributes.related_to.clone(),
                    external_id: delivery.primary_external_id().cloned(),
                    data_provider_id: attributes.data_provider_id.clone(),
                    destination_id,
                    delivered_at: self.clock.now(),
                };
                self.records.put_record(&record).await;
                self.events
                    .publish(&SystemEvent::observation_delivered(record.clone(), self.clock.now()))
                    .await?;
                tracing::info!(
                    external_id = record.external_id.as_ref().map(|id| id.as_str()),
                    "observation delivered",
                );
                Ok(DispatchSummary::Delivered(record))
            }
            Err(err) => self.report_failure(&attributes, destination_id, is_update, err).await,
        }
    }

    /// Resolves the provider key of a `v1` message from its data provider.
    ///
    /// Returns `None` for `v2` messages and for data providers without a type.
    async fn legacy_provider_key(
        &self,
        attributes: &RoutingAttributes,
    ) -> Result<Option<ProviderKey>, DispatchError> {
        if attributes.gundi_version != SchemaVersion::V1 {
            return Ok(None);
        }
        let Some(data_provider_id) = &attributes.data_provider_id else {
            return Ok(None);
        };
        self.integrations.provider_key_for(data_provider_id).await.map_err(|err| {
            tracing::error!(attention_needed = true, error = %err, "data provider lookup failed");
            DispatchError::ReferenceData(format!(
                "error getting data provider details for {data_provider_id}: {err}"
            ))
        })
    }

    /// Resolves the record a dependent message relies on.
    async fn related_record(
        &self,
        attributes: &RoutingAttributes,
        destination_id: &DestinationId,
    ) -> Result<DispatchRecord, DispatchError> {
        let lookup_id = attributes.related_lookup_id();
        let Some(record) = self.records.get_record(lookup_id, destination_id).await else {
            tracing::error!(
                attention_needed = true,
                related_to = %lookup_id,
                "related observation not found; will retry later",
            );
            return Err(DispatchError::ReferenceData(format!(
                "error getting related observation {lookup_id}"
            )));
        };
        if record.external_id.is_none() {
            tracing::error!(
                attention_needed = true,
                related_to = %lookup_id,
                "related observation was not dispatched yet; will retry later",
            );
            return Err(DispatchError::ReferenceData(format!(
                "related observation {lookup_id} was not dispatched yet"
            )));
        }
        Ok(record)
    }

    /// Builds the update notification body.
    fn updated_observation(
        &self,
        attributes: &RoutingAttributes,
        destination_id: DestinationId,
    ) -> UpdatedObservation {
        UpdatedObservation {
            gundi_id: attributes.gundi_id.clone(),
            related_to: attributes.related_to.clone(),
            data_provider_id: attributes.data_provider_id.clone(),
            destination_id,
            updated_at: self.clock.now(),
        }
    }

    /// Publishes the failure event (`v2` only) and returns the delivery error.
    async fn report_failure(
        &self,
        attributes: &RoutingAttributes,
        destination_id: DestinationId,
        is_update: bool,
        err: DeliveryError,
    ) -> Result<DispatchSummary, DispatchError> {
        tracing::error!(
            attention_needed = true,
            status_code = err.status_code(),
            error = %err,
            "delivery failed",
        );
        if attributes.gundi_version == SchemaVersion::V1 {
            return Err(DispatchError::Delivery {
                gundi_id: attributes.gundi_id.clone(),
                source: err,
            });
        }
        let now = self.clock.now();
        let event = if is_update {
            let update = self.updated_observation(attributes, destination_id);
            SystemEvent::observation_update_failed(ErrorDetails::from_delivery_error(&err, update), now)
        } else {
            let record = DispatchRecord {
                gundi_id: attributes.gundi_id.clone(),
                related_to: attributes.related_to.clone(),
                external_id: None,
                data_provider_id: attributes.data_provider_id.clone(),
                destination_id,
                delivered_at: now,
            };
            SystemEvent::observation_delivery_failed(
                ErrorDetails::from_delivery_error(&err, record),
                now,
            )
        };
        self.events.publish(&event).await?;
        Err(DispatchError::Delivery {
            gundi_id: attributes.gundi_id.clone(),
            source: err,
        })
    }
}
