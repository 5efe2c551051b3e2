// crates/gundi-dispatcher-server/src/lib.rs
// ============================================================================
// Module: Gundi Dispatcher Server Library
// Description: Push endpoint, service assembly and logging bootstrap.
// Purpose: Bind the message processor to an HTTP push subscription.
// Dependencies: axum, gundi-dispatcher-broker, gundi-dispatcher-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! The server receives push deliveries on `POST /`, hands each message to the
//! [`gundi_dispatcher_broker::MessageProcessor`], and maps the outcome to an
//! HTTP status the queue understands: `204` acknowledges and `503` asks for
//! redelivery.
//! Invariants:
//! - Every collaborator is built once at startup from validated configuration.
//! - Handlers never panic; failures become status codes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod app;
pub mod bootstrap;
pub mod logging;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use app::AppState;
pub use app::router;
pub use app::serve;
pub use bootstrap::ServerError;
pub use bootstrap::build_processor;
pub use logging::init_logging;
