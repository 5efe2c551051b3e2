// crates/gundi-dispatcher-broker/src/strategy/observation.rs
// ============================================================================
// Module: Gundi Dispatcher Observation Strategy
// Description: Posts telemetry observations.
// Purpose: Deliver position points to the destination's observation endpoint.
// Dependencies: gundi-dispatcher-core
// ============================================================================

//! ## Overview
//! The destination may or may not echo an id for observations; receipts
//! without one are still successful deliveries.

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
use gundi_dispatcher_core::ObservationPayload;
use gundi_dispatcher_core::StreamType;

use crate::strategy::DeliveryContext;
use crate::strategy::DeliveryStrategy;
use crate::strategy::json_body;
use crate::strategy::mismatched_payload;

// ============================================================================
// SECTION: Observation Strategy
// ============================================================================

/// Strategy for `obv` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservationStrategy;

#[async_trait]
impl DeliveryStrategy for ObservationStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::Observation
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        _context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::Observation(batch) = observation else {
            return Err(mismatched_payload(StreamType::Observation, observation));
        };
        post_observations(batch, client).await
    }
}

/// Posts each point in order, stopping at the first failure.
pub(crate) async fn post_observations(
    batch: &Batch<ObservationPayload>,
    client: &dyn DestinationClient,
) -> DeliveryOutcome {
    let mut receipts = Vec::with_capacity(batch.len());
    for point in batch.items() {
        let response = client.post_observation(json_body(point)?).await?;
        receipts.push(DeliveryReceipt::from_response(response));
    }
    Ok(Delivery::new(receipts))
}
