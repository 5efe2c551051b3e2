// crates/gundi-dispatcher-config/src/lib.rs
// ============================================================================
// Module: Gundi Dispatcher Config Library
// Description: Canonical config model, loading, and validation.
// Purpose: Single source of truth for gundi-dispatcher.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `gundi-dispatcher-config` defines the configuration model for the
//! dispatcher service. Loading is strict and fail-closed: a file that is too
//! large, not UTF-8, not TOML, or internally inconsistent is rejected before
//! any collaborator is constructed.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
