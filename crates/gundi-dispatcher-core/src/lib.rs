// crates/gundi-dispatcher-core/src/lib.rs
// ============================================================================
// Module: Gundi Dispatcher Core Library
// Description: Public API surface for the Gundi dispatcher core.
// Purpose: Expose core types and collaborator interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Gundi dispatcher core holds the destination-agnostic model for delivering
//! canonical observations to a destination platform: routing attributes,
//! payload shapes, dispatch records, system events, and the traits through
//! which the dispatcher reaches caches, portals, blob stores, destinations,
//! and queues. It performs no I/O itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::BlobError;
pub use interfaces::BlobFile;
pub use interfaces::BlobStore;
pub use interfaces::CacheBackend;
pub use interfaces::CacheError;
pub use interfaces::DestinationClient;
pub use interfaces::DestinationConnector;
pub use interfaces::IntegrationSource;
pub use interfaces::MessagePublisher;
pub use interfaces::OutboundMessage;
pub use interfaces::PortalError;
pub use interfaces::PublishError;
pub use interfaces::TraceSource;
