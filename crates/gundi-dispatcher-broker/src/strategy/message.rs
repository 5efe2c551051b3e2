// crates/gundi-dispatcher-broker/src/strategy/message.rs
// ============================================================================
// Module: Gundi Dispatcher Text Message Strategy
// Description: Maps inbound text messages to the destination message schema.
// Purpose: Post messages keyed by the sending device's manufacturer id.
// Dependencies: gundi-dispatcher-core, serde_json
// ============================================================================

//! ## Overview
//! The manufacturer id is the payload `sender` when present, else the
//! routing `external_source_id`. Device status and extra metadata travel in
//! the message's `additional` object.

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
use gundi_dispatcher_core::TextMessagePayload;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::strategy::DeliveryContext;
use crate::strategy::DeliveryStrategy;
use crate::strategy::mismatched_payload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message type used when the payload does not name one.
const DEFAULT_MESSAGE_TYPE: &str = "inbox";

// ============================================================================
// SECTION: Text Message Strategy
// ============================================================================

/// Strategy for `txt` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMessageStrategy;

impl TextMessageStrategy {
    /// Builds the destination message body.
    #[must_use]
    pub fn message_body(message: &TextMessagePayload) -> Value {
        let mut additional = message.additional.clone().unwrap_or_default();
        if let Some(status) = &message.status {
            additional.insert("status".to_string(), Value::Object(status.clone()));
        }
        if let Some(receiver) = &message.receiver {
            additional.entry("receiver").or_insert_with(|| Value::String(receiver.clone()));
        }
        let mut body = Map::new();
        body.insert(
            "message_type".to_string(),
            Value::String(
                message.message_type.clone().unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string()),
            ),
        );
        body.insert("text".to_string(), Value::String(message.text.clone()));
        body.insert("message_time".to_string(), Value::String(message.message_time.clone()));
        if let Some(location) = &message.device_location {
            body.insert(
                "device_location".to_string(),
                json!({"latitude": location.latitude, "longitude": location.longitude}),
            );
        }
        if !additional.is_empty() {
            body.insert("additional".to_string(), Value::Object(additional));
        }
        gundi_dispatcher_core::prune_nulls(Value::Object(body))
    }

    /// Picks the manufacturer id for a message.
    fn manufacturer_id<'a>(
        message: &'a TextMessagePayload,
        context: &'a DeliveryContext,
    ) -> Result<&'a str, DeliveryError> {
        message
            .sender
            .as_deref()
            .filter(|sender| !sender.trim().is_empty())
            .or(context.external_source_id.as_deref())
            .ok_or(DeliveryError::MissingContext("manufacturer_id"))
    }
}

#[async_trait]
impl DeliveryStrategy for TextMessageStrategy {
    fn stream_type(&self) -> StreamType {
        StreamType::TextMessage
    }

    async fn deliver(
        &self,
        observation: &CanonicalObservation,
        client: &dyn DestinationClient,
        context: &DeliveryContext,
    ) -> DeliveryOutcome {
        let CanonicalObservation::TextMessage(batch) = observation else {
            return Err(mismatched_payload(StreamType::TextMessage, observation));
        };
        let mut receipts = Vec::with_capacity(batch.len());
        for message in batch.items() {
            let manufacturer_id = Self::manufacturer_id(message, context)?;
            let response = client.post_message(manufacturer_id, Self::message_body(message)).await?;
            receipts.push(DeliveryReceipt::from_response(response));
        }
        Ok(Delivery::new(receipts))
    }
}
