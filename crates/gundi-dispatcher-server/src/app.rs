// crates/gundi-dispatcher-server/src/app.rs
// ============================================================================
// Module: Push Endpoint
// Description: axum router for push deliveries and health checks.
// Purpose: Translate processing outcomes into acknowledgement status codes.
// Dependencies: axum, gundi-dispatcher-broker, tokio, tracing
// ============================================================================

//! ## Overview
//! `POST /` accepts a push envelope (`{"message": {...}, "subscription": ..}`)
//! and `GET /healthz` reports liveness.
//! Invariants:
//! - `204` is returned only when the processor acknowledged the message.
//! - A body that is not a push envelope is answered with `400` and never processed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use gundi_dispatcher_broker::MessageProcessor;
use gundi_dispatcher_broker::ProcessingOutcome;
use gundi_dispatcher_broker::PushEnvelope;
use tokio::net::TcpListener;

use crate::bootstrap::ServerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the `CloudEvent` time in push deliveries.
pub const CLOUD_EVENT_TIME_HEADER: &str = "ce-time";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Queue message processor.
    processor: Arc<MessageProcessor>,
}

impl AppState {
    /// Wraps a processor for the router.
    #[must_use]
    pub fn new(processor: MessageProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the HTTP router.
#[must_use]
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", post(push_handler))
        .route("/healthz", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Io`] when the server stops with an I/O error.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| ServerError::Io(format!("server error: {err}")))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Liveness check.
async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Processes one push delivery.
async fn push_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let envelope = match PushEnvelope::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::error!(attention_needed = true, error = %err, "push request body rejected");
            return StatusCode::BAD_REQUEST;
        }
    };
    let event_time =
        headers.get(CLOUD_EVENT_TIME_HEADER).and_then(|value| value.to_str().ok()).map(str::trim);
    let outcome = state.processor.process(&envelope.message, event_time).await;
    status_for(&outcome)
}

/// Maps an outcome to the push acknowledgement status.
const fn status_for(outcome: &ProcessingOutcome) -> StatusCode {
    if outcome.acknowledges() { StatusCode::NO_CONTENT } else { StatusCode::SERVICE_UNAVAILABLE }
}
