// crates/gundi-dispatcher-broker/src/strategy/attachment.rs
// ============================================================================
// Module: Gundi Dispatcher Attachment Strategy
// Description: Uploads stored files to their owning destination event.
// Purpose: Move attachment files from blob storage to the destination.
// Dependencies: gundi-dispatcher-core, tracing
// ============================================================================

//! ## Overview
//! Files are downloaded, posted to the owning event, and removed from blob
//! storage as soon as their own upload succeeded.
//! Invariants:
//! - Files are never removed after a failed upload.
//! - A failure mid-batch leaves earlier files removed and later files stored.
//! - Removal failures are logged and do not fail the delivery.

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
use crate::strategy::mismatched_payload;

// ============================================================================
// SECTION: Attachment Strategy
// ============================================================================

/// Strategy for `att` messages.
pub struct AttachmentStrategy {
    /// Storage holding the files.
    blobs: Arc<dyn BlobStore>,
}

impl AttachmentStrategy {
    /// Creates the strategy over a blob store.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
        }
    }
}

#[async_trait]
impl DeliveryStrategy for AttachmentStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::Attachment
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::Attachment(batch) = observation else {
            return Err(mismatched_payload(StreamType::Attachment, observation));
        };
        let external_id = context
            .related_record
            .as_ref()
            .and_then(|record| record.external_id.as_ref())
            .ok_or(DeliveryError::MissingContext("related_record.external_id"))?;
        let mut receipts = Vec::with_capacity(batch.len());
        for attachment in batch.items() {
            let file = self
                .blobs
                .download(&attachment.file_path)
                .await
                .map_err(|err| DeliveryError::Blob(err.to_string()))?;
            let response = client.post_event_attachment(external_id, &file).await?;
            receipts.push(DeliveryReceipt::from_response(response));
            remove_delivered_blob(self.blobs.as_ref(), &attachment.file_path, context).await;
        }
        Ok(Delivery::new(receipts))
    }
}

/// Removes a delivered file, logging instead of failing when removal fails.
pub(crate) async fn remove_delivered_blob(blobs: &dyn BlobStore, path: &str, context: &DeliveryContext) {
    if let Err(err) = blobs.remove(path).await {
        tracing::warn!(
            gundi_id = %context.gundi_id,
            file_path = path,
            error = %err,
            "file delivered but blob removal failed",
        );
    }
}
