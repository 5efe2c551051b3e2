// crates/gundi-dispatcher-broker/src/delivery_cache.rs
// ============================================================================
// Module: Gundi Dispatcher Delivery Cache
// Description: Dispatch record lookups with trace fallback.
// Purpose: Find prior deliveries for attachments and updates without failing dispatch.
// Dependencies: gundi-dispatcher-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`DeliveryCache`] stores one [`DispatchRecord`] per `(gundi_id,
//! destination_id)` and rebuilds missing records from the portal trace service.
//! Invariants:
//! - Cache and trace failures degrade to "not found"; they never propagate.
//! - A record rebuilt from a trace is written back to the cache.
//! - Writes are best effort; failures are logged and swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use gundi_dispatcher_core::CacheBackend;
use gundi_dispatcher_core::Clock;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DispatchRecord;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::TraceSource;
use gundi_dispatcher_core::dispatch_record_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default record TTL.
pub const DEFAULT_DISPATCHED_RECORD_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// SECTION: Delivery Cache
// ============================================================================

/// Dispatch record store backed by a [`CacheBackend`].
pub struct DeliveryCache {
    /// Key-value backend.
    backend: Arc<dyn CacheBackend>,
    /// Authoritative trace source consulted on miss.
    traces: Option<Arc<dyn TraceSource>>,
    /// Record TTL.
    ttl: Duration,
    /// Clock used when a trace omits its delivery time.
    clock: Arc<dyn Clock>,
}

impl DeliveryCache {
    /// Creates a cache without trace fallback.
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            traces: None,
            ttl: DEFAULT_DISPATCHED_RECORD_TTL,
            clock,
        }
    }

    /// Enables trace reconstruction on cache miss.
    #[must_use]
    pub fn with_trace_source(mut self, traces: Arc<dyn TraceSource>) -> Self {
        self.traces = Some(traces);
        self
    }

    /// Overrides the record TTL.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the record for `(gundi_id, destination_id)`, if one is known.
    pub async fn get_record(
        &self,
        gundi_id: &GundiId,
        destination_id: &DestinationId,
    ) -> Option<DispatchRecord> {
        let key = dispatch_record_key(gundi_id, destination_id);
        match self.backend.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<DispatchRecord>(&raw) {
                Ok(record) => return Some(record),
                Err(err) => {
                    tracing::warn!(
                        cache_key = key.as_str(),
                        error = %err,
                        "ignoring unreadable dispatch record",
                    );
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    cache_key = key.as_str(),
                    error = %err,
                    "dispatch record cache read failed; treating as miss",
                );
            }
        }
        self.rebuild_from_trace(gundi_id, destination_id).await
    }

    /// Writes a record; failures are logged.
    pub async fn put_record(&self, record: &DispatchRecord) {
        let key = record.cache_key();
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(cache_key = key.as_str(), error = %err, "dispatch record not serializable");
                return;
            }
        };
        if let Err(err) = self.backend.set_ex(&key, &value, self.ttl).await {
            tracing::warn!(
                cache_key = key.as_str(),
                error = %err,
                "dispatch record cache write failed",
            );
        }
    }

    /// Looks up the trace service and re-caches the rebuilt record.
    async fn rebuild_from_trace(
        &self,
        gundi_id: &GundiId,
        destination_id: &DestinationId,
    ) -> Option<DispatchRecord> {
        let traces = self.traces.as_ref()?;
        match traces.find_trace(gundi_id, destination_id).await {
            Ok(Some(trace)) => {
                let record = trace.into_record(destination_id, self.clock.now());
                tracing::info!(
                    gundi_id = %gundi_id,
                    destination_id = %destination_id,
                    "dispatch record rebuilt from trace",
                );
                self.put_record(&record).await;
                Some(record)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(
                    gundi_id = %gundi_id,
                    destination_id = %destination_id,
                    error = %err,
                    "trace lookup failed; treating as miss",
                );
                None
            }
        }
    }
}
