// crates/gundi-dispatcher-broker/src/processor.rs
// ============================================================================
// Module: Gundi Dispatcher Message Processor
// Description: Queue-facing entry point applying dispositions.
// Purpose: Decode, check staleness, dispatch, and turn errors into ack/retry/dead-letter.
// Dependencies: base64, gundi-dispatcher-core, tracing
// ============================================================================

//! ## Overview
//! [`MessageProcessor::process`] is called once per queue delivery and always
//! returns a [`ProcessingOutcome`]; it never panics or propagates errors.
//! Invariants:
//! - Stale and undecodable messages are dead-lettered with their original attributes.
//! - Unsupported stream types are acknowledged without dead-lettering.
//! - A dead-letter that cannot be published turns into a retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gundi_dispatcher_core::Clock;
use gundi_dispatcher_core::Disposition;
use gundi_dispatcher_core::MessagePublisher;
use gundi_dispatcher_core::OutboundMessage;
use tracing::Instrument;

use crate::envelope::QueueMessage;
use crate::envelope::decode;
use crate::envelope::is_too_old;
use crate::orchestrator::DispatchSummary;
use crate::orchestrator::Dispatcher;
use crate::publisher::RetryPolicy;
use crate::publisher::publish_with_retry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum message age.
pub const DEFAULT_MAX_EVENT_AGE: Duration = Duration::from_secs(86_400);

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// What happened to a queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Delivered or updated.
    Dispatched(DispatchSummary),
    /// Forwarded to the dead-letter topic.
    DeadLettered {
        /// Why the message was dead-lettered.
        reason: String,
    },
    /// Acknowledged without delivery; operator attention required.
    Rejected {
        /// Why the message was rejected.
        reason: String,
    },
    /// Must be redelivered by the queue.
    Retry {
        /// Why the message must be retried.
        reason: String,
    },
}

impl ProcessingOutcome {
    /// Returns true when the queue message should be acknowledged.
    #[must_use]
    pub const fn acknowledges(&self) -> bool {
        !matches!(self, Self::Retry { .. })
    }
}

// ============================================================================
// SECTION: Processor
// ============================================================================

/// Queue-facing message processor.
pub struct MessageProcessor {
    /// Dispatch orchestrator.
    dispatcher: Dispatcher,
    /// Dead-letter publisher.
    dead_letters: Arc<dyn MessagePublisher>,
    /// Dead-letter topic.
    dead_letter_topic: String,
    /// Dead-letter retry settings.
    policy: RetryPolicy,
    /// Staleness threshold.
    max_event_age: Duration,
    /// Time source for staleness checks.
    clock: Arc<dyn Clock>,
}

impl MessageProcessor {
    /// Creates a processor with default staleness and retry settings.
    #[must_use]
    pub fn new(
        dispatcher: Dispatcher,
        dead_letters: Arc<dyn MessagePublisher>,
        dead_letter_topic: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dispatcher,
            dead_letters,
            dead_letter_topic: dead_letter_topic.into(),
            policy: RetryPolicy::default(),
            max_event_age: DEFAULT_MAX_EVENT_AGE,
            clock,
        }
    }

    /// Overrides the staleness threshold.
    #[must_use]
    pub const fn with_max_event_age(mut self, max_event_age: Duration) -> Self {
        self.max_event_age = max_event_age;
        self
    }

    /// Overrides the dead-letter retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Processes one queue message.
    ///
    /// `event_time` is the `CloudEvent` time when the binding supplies one; the
    /// message publish time is used otherwise.
    pub async fn process(&self, message: &QueueMessage, event_time: Option<&str>) -> ProcessingOutcome {
        let gundi_id = message
            .attributes
            .as_ref()
            .and_then(|attributes| attributes.get("gundi_id"))
            .map_or("", String::as_str);
        let span = tracing::info_span!(
            "dispatcher.process_message",
            message_id = message.message_id.as_deref().unwrap_or_default(),
            gundi_id,
        );
        self.process_inner(message, event_time).instrument(span).await
    }

    /// Runs decoding, staleness and dispatch.
    async fn process_inner(&self, message: &QueueMessage, event_time: Option<&str>) -> ProcessingOutcome {
        let raw_attributes = message.attributes.clone().unwrap_or_default();
        let decoded = match decode(message) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::error!(error = %err, dead_letter = true, "message could not be decoded");
                let data = STANDARD.decode(message.data.trim()).unwrap_or_else(|_| message.data.clone().into_bytes());
                return self.dead_letter(data, raw_attributes, err.to_string()).await;
            }
        };

        let timestamp = event_time.or(message.publish_time.as_deref());
        if is_too_old(timestamp, self.clock.now(), self.max_event_age) {
            tracing::warn!(
                timestamp,
                dead_letter = true,
                "message is too old; sending to dead letter",
            );
            return self.dead_letter(decoded.data, raw_attributes, "message is too old".to_string()).await;
        }

        tracing::info!(
            stream_type = decoded.attributes.stream_type.as_str(),
            "received transformed observation",
        );
        let data = decoded.data.clone();
        match self.dispatcher.dispatch(decoded).await {
            Ok(summary) => ProcessingOutcome::Dispatched(summary),
            Err(err) => match err.disposition() {
                Disposition::Retry => {
                    tracing::warn!(error = %err, "dispatch failed; message will be retried");
                    ProcessingOutcome::Retry {
                        reason: err.to_string(),
                    }
                }
                Disposition::Reject => {
                    tracing::error!(attention_needed = true, error = %err, "message rejected");
                    ProcessingOutcome::Rejected {
                        reason: err.to_string(),
                    }
                }
                Disposition::DeadLetter => {
                    tracing::error!(error = %err, dead_letter = true, "unexpected dispatch error");
                    self.dead_letter(data, raw_attributes, err.to_string()).await
                }
            },
        }
    }

    /// Forwards a message to the dead-letter topic.
    async fn dead_letter(
        &self,
        data: Vec<u8>,
        attributes: BTreeMap<String, String>,
        reason: String,
    ) -> ProcessingOutcome {
        let message = OutboundMessage::new(data).with_attributes(attributes);
        match publish_with_retry(self.dead_letters.as_ref(), &self.dead_letter_topic, &message, self.policy)
            .await
        {
            Ok(()) => {
                tracing::info!(topic = self.dead_letter_topic.as_str(), "message sent to dead letter");
                ProcessingOutcome::DeadLettered {
                    reason,
                }
            }
            Err(err) => {
                tracing::error!(
                    attention_needed = true,
                    topic = self.dead_letter_topic.as_str(),
                    error = %err,
                    "dead letter publish failed",
                );
                ProcessingOutcome::Retry {
                    reason: format!("{reason}; dead letter publish failed: {err}"),
                }
            }
        }
    }
}
