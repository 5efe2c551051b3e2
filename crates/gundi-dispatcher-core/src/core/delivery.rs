// crates/gundi-dispatcher-core/src/core/delivery.rs
// ============================================================================
// Module: Gundi Dispatcher Delivery Outcomes
// Description: Delivery receipts and structured delivery errors.
// Purpose: Carry destination status codes and bodies without stringly errors.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A strategy invocation yields [`DeliveryOutcome`]: a [`Delivery`] with one
//! [`DeliveryReceipt`] per batch item, or a [`DeliveryError`].
//! Invariants:
//! - Destination failures keep their HTTP status and raw body verbatim.
//! - Receipts are produced only after the destination confirmed success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ExternalId;

// ============================================================================
// SECTION: Receipts
// ============================================================================

/// Confirmation of one delivered item.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    /// Id echoed by the destination, when any.
    pub external_id: Option<ExternalId>,
    /// Destination response body.
    pub response: Value,
}

impl DeliveryReceipt {
    /// Builds a receipt from a destination response, reading `id` when present.
    #[must_use]
    pub fn from_response(response: Value) -> Self {
        let external_id = match response.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(ExternalId::new(id.clone())),
            Some(Value::Number(id)) => Some(ExternalId::new(id.to_string())),
            _ => None,
        };
        Self {
            external_id,
            response,
        }
    }
}

/// Successful delivery of a whole message.
///
/// # Invariants
/// - `receipts` follow input order; the first entry is the primary receipt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delivery {
    /// Receipts in batch order.
    pub receipts: Vec<DeliveryReceipt>,
}

impl Delivery {
    /// Creates a delivery from receipts.
    #[must_use]
    pub const fn new(receipts: Vec<DeliveryReceipt>) -> Self {
        Self {
            receipts,
        }
    }

    /// Returns the primary receipt.
    #[must_use]
    pub fn primary(&self) -> Option<&DeliveryReceipt> {
        self.receipts.first()
    }

    /// Returns the primary receipt's external id.
    #[must_use]
    pub fn primary_external_id(&self) -> Option<&ExternalId> {
        self.primary().and_then(|receipt| receipt.external_id.as_ref())
    }

    /// Returns the raw response, as a list for batches.
    #[must_use]
    pub fn raw_response(&self) -> Value {
        match self.receipts.as_slice() {
            [single] => single.response.clone(),
            many => Value::Array(many.iter().map(|receipt| receipt.response.clone()).collect()),
        }
    }
}

/// Result of a strategy invocation.
pub type DeliveryOutcome = Result<Delivery, DeliveryError>;

// ============================================================================
// SECTION: Delivery Errors
// ============================================================================

/// Failure delivering to the destination platform.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - HTTP variants always carry the status code and raw response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Destination rejected the request (400 and other unmapped 4xx).
    #[error("destination rejected request with status {status_code}: {response_body}")]
    BadRequest {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// Destination rejected the credentials (401).
    #[error("destination rejected credentials with status {status_code}: {response_body}")]
    BadCredentials {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// Destination denied the operation (403).
    #[error("destination denied permission with status {status_code}: {response_body}")]
    PermissionDenied {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// Destination object does not exist (404).
    #[error("destination resource not found with status {status_code}: {response_body}")]
    NotFound {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// Destination failed internally (500 and other unmapped 5xx).
    #[error("destination internal error with status {status_code}: {response_body}")]
    InternalError {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// Destination is unreachable behind its gateway (502, 503, 504).
    #[error("destination service unavailable with status {status_code}: {response_body}")]
    ServiceUnavailable {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// Destination returned a non-success status outside the mapped ranges.
    #[error("destination returned unexpected status {status_code}: {response_body}")]
    UnexpectedStatus {
        /// HTTP status.
        status_code: u16,
        /// Raw response body.
        response_body: String,
    },
    /// No HTTP response was obtained (connect, timeout, TLS).
    #[error("destination transport failure: {0}")]
    Transport(String),
    /// Destination response was not the expected JSON.
    #[error("destination response decode failure: {0}")]
    InvalidResponse(String),
    /// Attachment file could not be read from blob storage.
    #[error("attachment blob failure: {0}")]
    Blob(String),
    /// Observation payload does not match the stream schema.
    #[error("invalid observation payload: {0}")]
    InvalidPayload(String),
    /// Destination client could not be configured.
    #[error("destination configuration error: {0}")]
    Configuration(String),
    /// Delivery context is missing a value the strategy requires.
    #[error("delivery context missing {0}")]
    MissingContext(&'static str),
}

impl DeliveryError {
    /// Maps a non-success HTTP status to its error variant.
    #[must_use]
    pub fn from_status(status_code: u16, response_body: impl Into<String>) -> Self {
        let response_body = response_body.into();
        match status_code {
            401 => Self::BadCredentials {
                status_code,
                response_body,
            },
            403 => Self::PermissionDenied {
                status_code,
                response_body,
            },
            404 => Self::NotFound {
                status_code,
                response_body,
            },
            502..=504 => Self::ServiceUnavailable {
                status_code,
                response_body,
            },
            400..=499 => Self::BadRequest {
                status_code,
                response_body,
            },
            500..=599 => Self::InternalError {
                status_code,
                response_body,
            },
            _ => Self::UnexpectedStatus {
                status_code,
                response_body,
            },
        }
    }

    /// Returns the destination HTTP status, when one was received.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadRequest {
                status_code, ..
            }
            | Self::BadCredentials {
                status_code, ..
            }
            | Self::PermissionDenied {
                status_code, ..
            }
            | Self::NotFound {
                status_code, ..
            }
            | Self::InternalError {
                status_code, ..
            }
            | Self::ServiceUnavailable {
                status_code, ..
            }
            | Self::UnexpectedStatus {
                status_code, ..
            } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the raw destination response body, when one was received.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::BadRequest {
                response_body, ..
            }
            | Self::BadCredentials {
                response_body, ..
            }
            | Self::PermissionDenied {
                response_body, ..
            }
            | Self::NotFound {
                response_body, ..
            }
            | Self::InternalError {
                response_body, ..
            }
            | Self::ServiceUnavailable {
                response_body, ..
            }
            | Self::UnexpectedStatus {
                response_body, ..
            } => Some(response_body.as_str()),
            _ => None,
        }
    }

    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest {
                ..
            } => "BadRequest",
            Self::BadCredentials {
                ..
            } => "BadCredentials",
            Self::PermissionDenied {
                ..
            } => "PermissionDenied",
            Self::NotFound {
                ..
            } => "NotFound",
            Self::InternalError {
                ..
            } => "InternalError",
            Self::ServiceUnavailable {
                ..
            } => "ServiceUnavailable",
            Self::UnexpectedStatus {
                ..
            } => "UnexpectedStatus",
            Self::Transport(_) => "Transport",
            Self::InvalidResponse(_) => "InvalidResponse",
            Self::Blob(_) => "Blob",
            Self::InvalidPayload(_) => "InvalidPayload",
            Self::Configuration(_) => "Configuration",
            Self::MissingContext(_) => "MissingContext",
        }
    }
}
