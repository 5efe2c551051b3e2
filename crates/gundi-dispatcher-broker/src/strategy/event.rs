// crates/gundi-dispatcher-broker/src/strategy/event.rs
// ============================================================================
// Module: Gundi Dispatcher Event Strategy
// Description: Creates destination events.
// Purpose: POST each event once and read the destination id from the response.
// Dependencies: gundi-dispatcher-core
// ============================================================================

//! ## Overview
//! Events are posted without null members; the response `id` becomes the
//! receipt's external id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use gundi_dispatcher_core::Batch;
use gundi_dispatcher_core::CanonicalObservation;
use gundi_dispatcher_core::Delivery;
use gundi_dispatcher_core::DeliveryOutcome;
use gundi_dispatcher_core::DeliveryReceipt;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::EventPayload;
use gundi_dispatcher_core::StreamType;

use crate::strategy::DeliveryContext;
use crate::strategy::DeliveryStrategy;
use crate::strategy::json_body;
use crate::strategy::mismatched_payload;

// ============================================================================
// SECTION: Event Strategy
// ============================================================================

/// Strategy for `ev` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventStrategy;

#[async_trait]
impl DeliveryStrategy for EventStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::Event
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        _context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::Event(batch) = observation else {
            return Err(mismatched_payload(StreamType::Event, observation));
        };
        create_events(batch, client).await
    }
}

/// Creates each event in order, stopping at the first failure.
pub(crate) async fn create_events(batch: &Batch<EventPayload>, client: &dyn DestinationClient) -> DeliveryOutcome {
    let mut receipts = Vec::with_capacity(batch.len());
    for event in batch.items() {
        let response = client.create_event(json_body(event)?).await?;
        receipts.push(DeliveryReceipt::from_response(response));
    }
    Ok(Delivery::new(receipts))
}
