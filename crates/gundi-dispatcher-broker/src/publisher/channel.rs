// crates/gundi-dispatcher-broker/src/publisher/channel.rs
// ============================================================================
// Module: Gundi Dispatcher Channel Publisher
// Description: Publisher that forwards messages into a Tokio mpsc channel.
// Purpose: Observe published system events and dead-letters in-process.
// Dependencies: gundi-dispatcher-core, tokio
// ============================================================================

//! ## Overview
//! [`ChannelPublisher`] enqueues one [`PublishedMessage`] per publish call.
//! Invariants:
//! - A full channel is a transient failure; a closed channel is permanent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use gundi_dispatcher_core::MessagePublisher;
use gundi_dispatcher_core::OutboundMessage;
use gundi_dispatcher_core::PublishError;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;

// ============================================================================
// SECTION: Channel Publisher
// ============================================================================

/// Message captured by a [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Destination topic.
    pub topic: String,
    /// Published message.
    pub message: OutboundMessage,
}

/// Channel-based publisher.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    /// Sender used to forward messages.
    sender: Sender<PublishedMessage>,
}

impl ChannelPublisher {
    /// Creates a publisher over a channel sender.
    #[must_use]
    pub const fn new(sender: Sender<PublishedMessage>) -> Self {
        Self {
            sender,
        }
    }
}

#[async_trait]
impl MessagePublisher for ChannelPublisher {
    async fn publish(&self, topic: &str, message: &OutboundMessage) -> Result<(), PublishError> {
        let published = PublishedMessage {
            topic: topic.to_string(),
            message: message.clone(),
        };
        self.sender.try_send(published).map_err(|err| match err {
            TrySendError::Full(_) => PublishError::Transient("channel is full".to_string()),
            TrySendError::Closed(_) => PublishError::Permanent("channel is closed".to_string()),
        })
    }
}
