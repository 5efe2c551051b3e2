// crates/gundi-dispatcher-server/src/bootstrap.rs
// ============================================================================
// Module: Service Assembly
// Description: Builds the message processor and its collaborators from config.
// Purpose: Keep backend selection out of the request path.
// Dependencies: gundi-dispatcher-broker, gundi-dispatcher-config, gundi-dispatcher-store-redis
// ============================================================================

//! ## Overview
//! [`build_processor`] turns a validated [`GundiDispatcherConfig`] into a
//! ready [`MessageProcessor`]: cache backend, portal client, destination
//! connector, blob store and Pub/Sub publishers.
//! Invariants:
//! - Configuration is validated before any collaborator is built.
//! - Secrets are passed to clients and never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use gundi_dispatcher_broker::DeliveryCache;
use gundi_dispatcher_broker::Dispatcher;
use gundi_dispatcher_broker::DirectoryBlobStore;
use gundi_dispatcher_broker::HttpDestinationConnector;
use gundi_dispatcher_broker::IntegrationResolver;
use gundi_dispatcher_broker::MemoryBlobStore;
use gundi_dispatcher_broker::MemoryCacheBackend;
use gundi_dispatcher_broker::MessageProcessor;
use gundi_dispatcher_broker::PortalClient;
use gundi_dispatcher_broker::PubSubPublisher;
use gundi_dispatcher_broker::RetryPolicy;
use gundi_dispatcher_broker::StrategyRegistry;
use gundi_dispatcher_broker::SystemEventPublisher;
use gundi_dispatcher_config::BlobStoreConfig;
use gundi_dispatcher_config::CacheBackendKind;
use gundi_dispatcher_config::CacheConfig;
use gundi_dispatcher_config::ConfigError;
use gundi_dispatcher_config::GundiDispatcherConfig;
use gundi_dispatcher_core::BlobStore;
use gundi_dispatcher_core::CacheBackend;
use gundi_dispatcher_core::Clock;
use gundi_dispatcher_core::MessagePublisher;
use gundi_dispatcher_core::SystemClock;
use gundi_dispatcher_store_redis::RedisCacheBackend;
use gundi_dispatcher_store_redis::RedisCacheConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and runtime errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// A collaborator could not be built.
    #[error("startup error: {0}")]
    Startup(String),
    /// Logging could not be initialized.
    #[error("logging error: {0}")]
    Logging(String),
    /// Socket or server I/O failed.
    #[error("io error: {0}")]
    Io(String),
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Builds the message processor described by `config`.
///
/// # Errors
///
/// Returns [`ServerError`] when validation fails or a collaborator cannot be
/// constructed.
pub fn build_processor(config: &GundiDispatcherConfig) -> Result<MessageProcessor, ServerError> {
    config.validate()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = cache_backend(&config.cache)?;
    let blobs = blob_store(&config.blob_store)?;

    let portal = Arc::new(
        PortalClient::new(
            config.portal.base_url.clone(),
            config.portal.token.clone(),
            config.portal.connect_timeout(),
            config.portal.read_timeout(),
        )
        .map_err(|err| ServerError::Startup(err.to_string()))?,
    );
    let connector = Arc::new(
        HttpDestinationConnector::new(
            config.destination.connect_timeout(),
            config.destination.read_timeout(),
        )
        .map_err(|err| ServerError::Startup(err.to_string()))?,
    );
    let publisher: Arc<dyn MessagePublisher> = Arc::new(
        PubSubPublisher::new(
            config.publisher.endpoint.clone(),
            config.publisher.project_id.clone(),
            config.publisher.access_token.clone(),
            config.publisher.timeout(),
        )
        .map_err(|err| ServerError::Startup(err.to_string()))?,
    );
    let policy = RetryPolicy::new(config.publisher.max_attempts, config.publisher.initial_backoff());

    let integrations = IntegrationResolver::new(portal.clone(), Arc::clone(&cache))
        .with_ttl(config.cache.integration_config_ttl());
    let records = DeliveryCache::new(cache, Arc::clone(&clock))
        .with_trace_source(portal)
        .with_ttl(config.cache.dispatched_record_ttl());
    let events = SystemEventPublisher::new(
        Arc::clone(&publisher),
        config.dispatch.dispatcher_events_topic.clone(),
    )
    .with_policy(policy);
    let dispatcher = Dispatcher::new(
        integrations,
        records,
        StrategyRegistry::with_defaults(blobs),
        connector,
        events,
        Arc::clone(&clock),
    );
    tracing::info!(
        cache_backend = cache_backend_label(config.cache.backend),
        events_topic = config.dispatch.dispatcher_events_topic.as_str(),
        dead_letter_topic = config.dispatch.dead_letter_topic.as_str(),
        "dispatcher assembled",
    );
    Ok(MessageProcessor::new(dispatcher, publisher, config.dispatch.dead_letter_topic.clone(), clock)
        .with_max_event_age(config.dispatch.max_event_age())
        .with_retry_policy(policy))
}

/// Builds the configured cache backend.
fn cache_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, ServerError> {
    match config.backend {
        CacheBackendKind::Memory => Ok(Arc::new(MemoryCacheBackend::new())),
        CacheBackendKind::Redis => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| ServerError::Config("cache.url is required for redis".to_string()))?;
            let redis = RedisCacheConfig::new(url).with_key_prefix(config.key_prefix.clone());
            let backend =
                RedisCacheBackend::new(&redis).map_err(|err| ServerError::Startup(err.to_string()))?;
            Ok(Arc::new(backend))
        }
    }
}

/// Builds the configured blob store.
fn blob_store(config: &BlobStoreConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config {
        BlobStoreConfig::Memory => {
            tracing::warn!("using in-memory blob store; attachments cannot be delivered");
            Ok(Arc::new(MemoryBlobStore::new()))
        }
        BlobStoreConfig::Directory(directory) => {
            let store = DirectoryBlobStore::open(Path::new(directory.root.trim()))
                .map_err(|err| ServerError::Startup(err.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

/// Log label for a cache backend.
const fn cache_backend_label(kind: CacheBackendKind) -> &'static str {
    match kind {
        CacheBackendKind::Memory => "memory",
        CacheBackendKind::Redis => "redis",
    }
}
