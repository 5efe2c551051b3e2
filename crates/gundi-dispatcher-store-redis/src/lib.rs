// crates/gundi-dispatcher-store-redis/src/lib.rs
// ============================================================================
// Module: Gundi Dispatcher Redis Store Library
// Description: Redis-backed cache backend for dispatch records and integrations.
// Purpose: Share dispatch state across dispatcher instances.
// Dependencies: deadpool-redis, gundi-dispatcher-core, redis
// ============================================================================

//! ## Overview
//! Provides [`RedisCacheBackend`], a pooled implementation of
//! [`gundi_dispatcher_core::CacheBackend`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::RedisCacheBackend;
pub use store::RedisCacheConfig;
pub use store::RedisStoreError;
