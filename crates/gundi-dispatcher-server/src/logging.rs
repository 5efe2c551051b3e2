// crates/gundi-dispatcher-server/src/logging.rs
// ============================================================================
// Module: Logging Bootstrap
// Description: Installs the global tracing subscriber.
// Purpose: Emit structured dispatcher logs as compact text or JSON lines.
// Dependencies: gundi-dispatcher-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! `RUST_LOG` takes precedence over the configured level so operators can
//! raise verbosity without editing the config file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use gundi_dispatcher_config::LogFormat;
use gundi_dispatcher_config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::bootstrap::ServerError;

// ============================================================================
// SECTION: Initialization
// ============================================================================

/// Builds the level filter for `config`.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.trim()))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`ServerError::Logging`] when a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ServerError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));
    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(true)).try_init(),
        LogFormat::Text => registry.with(fmt::layer().compact()).try_init(),
    };
    result.map_err(|err| ServerError::Logging(err.to_string()))
}
