// crates/gundi-dispatcher-broker/src/strategy/legacy.rs
// ============================================================================
// Module: Gundi Dispatcher Legacy Strategies
// Description: Delivery strategies for `v1` positions, geo events and camera traps.
// Purpose: Keep legacy producers flowing through the shared dispatch pipeline.
// Dependencies: async-trait, gundi-dispatcher-core, tracing
// ============================================================================

//! ## Overview
//! Positions post to the observation endpoint and geo events create events,
//! one call per item. Camera trap reports download their image from blob
//! storage, post report and image together, and remove the image once the
//! destination accepted it.
//! Invariants:
//! - An image is never removed after a failed report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use gundi_dispatcher_core::BlobStore;
use gundi_dispatcher_core::CanonicalObservation;
use gundi_dispatcher_core::Delivery;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DeliveryOutcome;
use gundi_dispatcher_core::DeliveryReceipt;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::StreamType;

use crate::strategy::DeliveryContext;
use crate::strategy::DeliveryStrategy;
use crate::strategy::attachment::remove_delivered_blob;
use crate::strategy::event::create_events;
use crate::strategy::json_body;
use crate::strategy::mismatched_payload;
use crate::strategy::observation::post_observations;

// ============================================================================
// SECTION: Position Strategy
// ============================================================================

/// Strategy for `ps` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionStrategy;

#[async_trait]
impl DeliveryStrategy for PositionStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::Position
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        _context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::Position(batch) = observation else {
            return Err(mismatched_payload(StreamType::Position, observation));
        };
        post_observations(batch, client).await
    }
}

// ============================================================================
// SECTION: Geo Event Strategy
// ============================================================================

/// Strategy for `ge` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEventStrategy;

#[async_trait]
impl DeliveryStrategy for GeoEventStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::GeoEvent
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        _context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::GeoEvent(batch) = observation else {
            return Err(mismatched_payload(StreamType::GeoEvent, observation));
        };
        create_events(batch, client).await
    }
}

// ============================================================================
// SECTION: Camera Trap Strategy
// ============================================================================

/// Strategy for `ct` messages.
pub struct CameraTrapStrategy {
    /// Storage holding the images.
    blobs: Arc<dyn BlobStore>,
}

impl CameraTrapStrategy {
    /// Creates the strategy over a blob store.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
        }
    }
}

#[async_trait]
impl DeliveryStrategy for CameraTrapStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::CameraTrap
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::CameraTrap(batch) = observation else {
            return Err(mismatched_payload(StreamType::CameraTrap, observation));
        };
        let mut receipts = Vec::with_capacity(batch.len());
        for report in batch.items() {
            let file = self
                .blobs
                .download(&report.file)
                .await
                .map_err(|err| DeliveryError::Blob(err.to_string()))?;
            let response = client.post_camera_trap_report(json_body(report)?, &file).await?;
            receipts.push(DeliveryReceipt::from_response(response));
            remove_delivered_blob(self.blobs.as_ref(), &report.file, context).await;
        }
        Ok(Delivery::new(receipts))
    }
}
