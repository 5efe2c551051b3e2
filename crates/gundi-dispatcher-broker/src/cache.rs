// crates/gundi-dispatcher-broker/src/cache.rs
// ============================================================================
// Module: Gundi Dispatcher In-Memory Cache
// Description: Process-local cache backend with per-key expiry.
// Purpose: Stand in for Redis in tests and single-instance deployments.
// Dependencies: gundi-dispatcher-core
// ============================================================================

//! ## Overview
//! [`MemoryCacheBackend`] stores string values with an absolute expiry.
//! Invariants:
//! - Expired entries are never returned.
//! - Every write prunes entries that have expired, so keys that are never
//!   read again do not accumulate.
//! - Writes never affect another live key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use gundi_dispatcher_core::CacheBackend;
use gundi_dispatcher_core::CacheError;

// ============================================================================
// SECTION: Memory Cache
// ============================================================================

/// Cached value with its expiry.
#[derive(Debug, Clone)]
struct Entry {
    /// Stored value.
    value: String,
    /// Instant after which the entry is gone.
    expires_at: Instant,
}

/// In-memory [`CacheBackend`].
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    /// Entries keyed by cache key.
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheBackend {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|entry| entry.expires_at > now).count())
            .unwrap_or_default()
    }

    /// Returns true when no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries =
            self.entries.lock().map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))?;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at =
            now.checked_add(ttl).ok_or_else(|| CacheError::Backend("cache ttl overflow".to_string()))?;
        let mut entries =
            self.entries.lock().map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::*;

    #[tokio::test]
    async fn writes_prune_expired_entries() {
        let cache = MemoryCacheBackend::new();
        cache.set_ex("dispatched_observation.stale", "{}", Duration::ZERO).await.unwrap();
        cache.set_ex("dispatched_observation.live", "{}", Duration::from_secs(60)).await.unwrap();

        let keys: Vec<String> = cache.entries.lock().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["dispatched_observation.live".to_string()]);
        assert_eq!(cache.get("dispatched_observation.live").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn overwriting_a_key_keeps_one_entry() {
        let cache = MemoryCacheBackend::new();
        cache.set_ex("k", "old", Duration::from_secs(60)).await.unwrap();
        cache.set_ex("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }
}
