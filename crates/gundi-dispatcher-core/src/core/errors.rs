// crates/gundi-dispatcher-core/src/core/errors.rs
// ============================================================================
// Module: Gundi Dispatcher Error Taxonomy
// Description: Dispatch errors and their queue dispositions.
// Purpose: Decide retry vs dead-letter vs reject from the error type alone.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`DispatchError`] is the only error the orchestrator returns. Each variant
//! maps to exactly one [`Disposition`].
//! Invariants:
//! - Reference-data and reported delivery failures are retried by the queue.
//! - Unsupported stream types are rejected without dead-lettering.
//! - Anything unclassified is dead-lettered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::delivery::DeliveryError;
use crate::core::identifiers::GundiId;
use crate::interfaces::PublishError;

// ============================================================================
// SECTION: Disposition
// ============================================================================

/// What the queue binding should do with a failed message.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Signal failure so the queue redelivers.
    Retry,
    /// Forward to the dead-letter topic and acknowledge.
    DeadLetter,
    /// Acknowledge without dead-lettering; operator attention required.
    Reject,
}

// ============================================================================
// SECTION: Dispatch Errors
// ============================================================================

/// Errors returned by dispatch orchestration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Delivery` is raised only after the failure event was published.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Required reference data is not available yet.
    #[error("reference data error: {0}")]
    ReferenceData(String),
    /// Destination rejected the delivery; already reported via a system event.
    #[error("exception occurred dispatching observation {gundi_id}: {source}")]
    Delivery {
        /// Canonical object id.
        gundi_id: GundiId,
        /// Underlying destination failure.
        #[source]
        source: DeliveryError,
    },
    /// No strategy is registered for the stream type.
    #[error("stream type `{0}` is not supported by this dispatcher")]
    UnsupportedStreamType(String),
    /// Outcome notification could not be published.
    #[error("system event publish failed: {0}")]
    Publish(#[from] PublishError),
    /// Unclassified internal failure.
    #[error("unexpected internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Returns the queue disposition for this error.
    #[must_use]
    pub const fn disposition(&self) -> Disposition {
        match self {
            Self::ReferenceData(_)
            | Self::Delivery {
                ..
            }
            | Self::Publish(_) => Disposition::Retry,
            Self::UnsupportedStreamType(_) => Disposition::Reject,
            Self::Internal(_) => Disposition::DeadLetter,
        }
    }
}
