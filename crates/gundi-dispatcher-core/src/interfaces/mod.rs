// crates/gundi-dispatcher-core/src/interfaces/mod.rs
// ============================================================================
// Module: Gundi Dispatcher Interfaces
// Description: Collaborator traits for cache, portal, blobs, destinations, and queues.
// Purpose: Keep dispatch logic independent of concrete I/O backends.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The dispatcher talks to the outside world only through these traits.
//! Backends are constructed at process start and injected explicitly.
//! Invariants:
//! - Implementations must be `Send + Sync` and safe under concurrent calls.
//! - Errors are typed per collaborator; none of them panic.
//!
//! Security posture: all collaborator data is untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::delivery::DeliveryError;
use crate::core::identifiers::DestinationId;
use crate::core::identifiers::ExternalId;
use crate::core::identifiers::GundiId;
use crate::core::identifiers::ProviderKey;
use crate::core::integration::DestinationIntegration;
use crate::core::record::DispatchTrace;

// ============================================================================
// SECTION: Cache Backend
// ============================================================================

/// Cache backend errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Backend could not be reached.
    #[error("cache connection failure: {0}")]
    Connection(String),
    /// Backend rejected or failed the command.
    #[error("cache backend failure: {0}")]
    Backend(String),
}

/// String key-value store with per-key TTL.
///
/// # Invariants
/// - Operations on independent keys never interfere.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Writes a value that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

// ============================================================================
// SECTION: Portal
// ============================================================================

/// Configuration portal errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    /// Request did not complete.
    #[error("portal transport failure: {0}")]
    Transport(String),
    /// Portal answered with a non-success status.
    #[error("portal returned status {status_code}: {body}")]
    Status {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        body: String,
    },
    /// Portal response did not match the expected schema.
    #[error("portal response decode failure: {0}")]
    Decode(String),
}

/// Source of destination integration details.
#[async_trait]
pub trait IntegrationSource: Send + Sync {
    /// Fetches integration details; `Ok(None)` when the portal has none.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the lookup fails.
    async fn integration_details(
        &self,
        destination_id: &DestinationId,
    ) -> Result<Option<DestinationIntegration>, PortalError>;
}

/// Authoritative source of delivery traces.
#[async_trait]
pub trait TraceSource: Send + Sync {
    /// Finds the first trace for `(gundi_id, destination_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the lookup fails.
    async fn find_trace(
        &self,
        gundi_id: &GundiId,
        destination_id: &DestinationId,
    ) -> Result<Option<DispatchTrace>, PortalError>;
}

// ============================================================================
// SECTION: Blob Store
// ============================================================================

/// Blob storage errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// No object at the path.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// Path escapes the store root or is malformed.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    /// Storage I/O failed.
    #[error("blob io failure: {0}")]
    Io(String),
}

/// File downloaded from blob storage.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobFile {
    /// Store path the file was read from.
    pub path: String,
    /// File name (last path segment).
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl BlobFile {
    /// Creates a blob file, deriving the name from the path.
    #[must_use]
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let file_name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            file_name,
            bytes,
        }
    }
}

impl fmt::Debug for BlobFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobFile")
            .field("path", &self.path)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Storage holding attachment files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Downloads a file.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the file cannot be read.
    async fn download(&self, path: &str) -> Result<BlobFile, BlobError>;

    /// Removes a file.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the file cannot be removed.
    async fn remove(&self, path: &str) -> Result<(), BlobError>;
}

// ============================================================================
// SECTION: Destination Platform
// ============================================================================

/// Client bound to one destination and provider key.
///
/// # Invariants
/// - Each method performs at most one mutating request against the destination.
/// - Successful calls return the unwrapped JSON body of the response.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the destination call fails.
    async fn create_event(&self, event: Value) -> Result<Value, DeliveryError>;

    /// Patches an existing event.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the destination call fails.
    async fn patch_event(
        &self,
        external_id: &ExternalId,
        changes: Value,
    ) -> Result<Value, DeliveryError>;

    /// Uploads a file attached to an existing event.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the destination call fails.
    async fn post_event_attachment(
        &self,
        external_id: &ExternalId,
        file: &BlobFile,
    ) -> Result<Value, DeliveryError>;

    /// Posts a telemetry observation.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the destination call fails.
    async fn post_observation(&self, observation: Value) -> Result<Value, DeliveryError>;

    /// Posts a text message keyed by manufacturer id.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the destination call fails.
    async fn post_message(
        &self,
        manufacturer_id: &str,
        message: Value,
    ) -> Result<Value, DeliveryError>;

    /// Posts a legacy camera trap report together with its image.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the destination call fails.
    async fn post_camera_trap_report(
        &self,
        report: Value,
        file: &BlobFile,
    ) -> Result<Value, DeliveryError>;
}

/// Builds destination clients from integration details.
pub trait DestinationConnector: Send + Sync {
    /// Returns a client for the destination and provider key.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Configuration`] when the integration is unusable.
    fn connect(
        &self,
        integration: &DestinationIntegration,
        provider_key: &ProviderKey,
    ) -> Result<Arc<dyn DestinationClient>, DeliveryError>;
}

// ============================================================================
// SECTION: Message Publisher
// ============================================================================

/// Publishing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Transport failure worth retrying (connect, timeout, 5xx, 429).
    #[error("transient publish failure: {0}")]
    Transient(String),
    /// Failure that will not succeed on retry.
    #[error("permanent publish failure: {0}")]
    Permanent(String),
    /// Message could not be serialized.
    #[error("publish serialization failure: {0}")]
    Serialization(String),
}

impl PublishError {
    /// Returns true when the failure may succeed on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Message bound for a queue topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Message body.
    pub data: Vec<u8>,
    /// Message attributes.
    pub attributes: BTreeMap<String, String>,
}

impl OutboundMessage {
    /// Creates a message with no attributes.
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            attributes: BTreeMap::new(),
        }
    }

    /// Replaces the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Queue publisher.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publishes one message to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the message was not accepted.
    async fn publish(&self, topic: &str, message: &OutboundMessage) -> Result<(), PublishError>;
}
