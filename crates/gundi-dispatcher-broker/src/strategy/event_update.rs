// crates/gundi-dispatcher-broker/src/strategy/event_update.rs
// ============================================================================
// Module: Gundi Dispatcher Event Update Strategy
// Description: Patches previously delivered events.
// Purpose: Send only the `changes` object to the recorded destination event.
// Dependencies: gundi-dispatcher-core
// ============================================================================

//! ## Overview
//! Updates require the destination id recorded when the event was created.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use gundi_dispatcher_core::CanonicalObservation;
use gundi_dispatcher_core::Delivery;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DeliveryOutcome;
use gundi_dispatcher_core::DeliveryReceipt;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::StreamType;
use serde_json::Value;

use crate::strategy::DeliveryContext;
use crate::strategy::DeliveryStrategy;
use crate::strategy::mismatched_payload;

// ============================================================================
// SECTION: Event Update Strategy
// ============================================================================

/// Strategy for `evu` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventUpdateStrategy;

#[async_trait]
impl DeliveryStrategy for EventUpdateStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::EventUpdate
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::EventUpdate(batch) = observation else {
            return Err(mismatched_payload(StreamType::EventUpdate, observation));
        };
        let external_id =
            context.external_id.as_ref().ok_or(DeliveryError::MissingContext("external_id"))?;
        let mut receipts = Vec::with_capacity(batch.len());
        for update in batch.items() {
            let response =
                client.patch_event(external_id, Value::Object(update.changes.clone())).await?;
            receipts.push(DeliveryReceipt::from_response(response));
        }
        Ok(Delivery::new(receipts))
    }
}
