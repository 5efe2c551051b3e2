// crates/gundi-dispatcher-broker/src/publisher/mod.rs
// ============================================================================
// Module: Gundi Dispatcher Publishers
// Description: System event publishing with retry, plus queue publishers.
// Purpose: Deliver outcome notifications and dead-letters without dropping failures.
// Dependencies: gundi-dispatcher-core, tokio, tracing
// ============================================================================

//! ## Overview
//! [`SystemEventPublisher`] serializes [`SystemEvent`]s and publishes them to
//! the dispatcher events topic. [`publish_with_retry`] retries transient
//! failures with exponential backoff and surfaces the last error.
//! Invariants:
//! - Only transient failures are retried.
//! - At most `max_attempts` publish calls are made per message.
//! - The final failure always propagates to the caller.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod channel;
pub mod pubsub;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use gundi_dispatcher_core::MessagePublisher;
use gundi_dispatcher_core::OutboundMessage;
use gundi_dispatcher_core::PublishError;
use gundi_dispatcher_core::SystemEvent;

pub use self::channel::ChannelPublisher;
pub use self::channel::PublishedMessage;
pub use self::pubsub::PubSubPublisher;

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Backoff settings for publishing.
///
/// # Invariants
/// - `max_attempts` is at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum publish attempts.
    max_attempts: u32,
    /// Delay before the second attempt; doubled per attempt.
    initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy, clamping attempts to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    /// Returns the maximum attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Publishes a message, retrying transient failures.
///
/// # Errors
///
/// Returns the last [`PublishError`] once attempts are exhausted or a
/// non-transient failure occurs.
pub async fn publish_with_retry(
    publisher: &dyn MessagePublisher,
    topic: &str,
    message: &OutboundMessage,
    policy: RetryPolicy,
) -> Result<(), PublishError> {
    let mut attempt = 1;
    loop {
        match publisher.publish(topic, message).await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                tracing::warn!(topic, attempt, error = %err, "publish failed; retrying");
                tokio::time::sleep(policy.backoff_for_attempt(attempt)).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(topic, attempt, error = %err, "publish failed");
                return Err(err);
            }
        }
    }
}

// ============================================================================
// SECTION: System Event Publisher
// ============================================================================

/// Publisher for dispatcher outcome notifications.
pub struct SystemEventPublisher {
    /// Underlying queue publisher.
    publisher: Arc<dyn MessagePublisher>,
    /// Dispatcher events topic.
    topic: String,
    /// Retry settings.
    policy: RetryPolicy,
}

impl SystemEventPublisher {
    /// Creates a publisher for `topic`.
    #[must_use]
    pub fn new(publisher: Arc<dyn MessagePublisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            policy: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the events topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publishes a system event.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when serialization fails or retries are exhausted.
    pub async fn publish(&self, event: &SystemEvent) -> Result<(), PublishError> {
        let data = event.to_json_bytes().map_err(|err| PublishError::Serialization(err.to_string()))?;
        publish_with_retry(self.publisher.as_ref(), &self.topic, &OutboundMessage::new(data), self.policy)
            .await?;
        tracing::debug!(
            topic = self.topic.as_str(),
            event_type = event.event_type.as_str(),
            event_id = %event.event_id,
            "system event published",
        );
        Ok(())
    }
}
