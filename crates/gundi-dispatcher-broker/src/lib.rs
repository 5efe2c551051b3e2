// crates/gundi-dispatcher-broker/src/lib.rs
// ============================================================================
// Module: Gundi Dispatcher Broker Library
// Description: Dispatch orchestration plus reference collaborator implementations.
// Purpose: Deliver decoded queue messages to destination platforms.
// Dependencies: gundi-dispatcher-core, reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! The broker decodes queue envelopes, resolves destination configuration and
//! prior deliveries, runs a per-stream [`DeliveryStrategy`], and publishes the
//! outcome. [`MessageProcessor`] turns every result into ack, retry or
//! dead-letter.
//! Invariants:
//! - Dispatch records are written only after confirmed delivery.
//! - Destination failures keep their status code and body end to end.
//! - Cache failures never abort a dispatch.
//!
//! Security posture: queue messages, portal responses and destination
//! responses are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod blob;
pub mod cache;
pub mod delivery_cache;
pub mod destination;
pub mod envelope;
pub mod integrations;
pub mod orchestrator;
pub mod portal;
pub mod processor;
pub mod publisher;
pub mod strategy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use blob::DirectoryBlobStore;
pub use blob::MemoryBlobStore;
pub use cache::MemoryCacheBackend;
pub use delivery_cache::DeliveryCache;
pub use destination::Credentials;
pub use destination::DestinationUrls;
pub use destination::HttpDestinationClient;
pub use destination::HttpDestinationConnector;
pub use envelope::DecodedMessage;
pub use envelope::EnvelopeError;
pub use envelope::PushEnvelope;
pub use envelope::QueueMessage;
pub use envelope::decode;
pub use envelope::encode;
pub use envelope::is_too_old;
pub use integrations::IntegrationResolver;
pub use orchestrator::DispatchSummary;
pub use orchestrator::Dispatcher;
pub use portal::PortalClient;
pub use processor::MessageProcessor;
pub use processor::ProcessingOutcome;
pub use publisher::ChannelPublisher;
pub use publisher::PubSubPublisher;
pub use publisher::PublishedMessage;
pub use publisher::RetryPolicy;
pub use publisher::SystemEventPublisher;
pub use strategy::AttachmentStrategy;
pub use strategy::CameraTrapStrategy;
pub use strategy::DeliveryContext;
pub use strategy::DeliveryStrategy;
pub use strategy::EventStrategy;
pub use strategy::EventUpdateStrategy;
pub use strategy::GeoEventStrategy;
pub use strategy::ObservationStrategy;
pub use strategy::PositionStrategy;
pub use strategy::StrategyRegistry;
pub use strategy::StrategyRegistryBuilder;
pub use strategy::TextMessageStrategy;
