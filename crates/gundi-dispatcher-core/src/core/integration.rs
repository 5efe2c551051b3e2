// crates/gundi-dispatcher-core/src/core/integration.rs
// ============================================================================
// Module: Gundi Dispatcher Destination Integrations
// Description: Destination integration details resolved from the portal.
// Purpose: Expose auth and push-endpoint settings for a destination.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`DestinationIntegration`] is fetched from the configuration portal and
//! cached with a short TTL. Settings are grouped by action: the `auth` action
//! carries credentials; `push_*` actions may override endpoint paths.
//! Invariants:
//! - Integrations are read-only after fetch.
//! - Credentials never appear in `Debug` output.
//!
//! Security posture: credentials are secrets and must not be logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::DestinationId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Action value holding authentication settings.
pub const AUTH_ACTION: &str = "auth";
/// Action value that may override the events path.
pub const PUSH_EVENTS_ACTION: &str = "push_events";
/// Action value that may override the observations path.
pub const PUSH_OBSERVATIONS_ACTION: &str = "push_observations";
/// Action value that may override the messages path.
pub const PUSH_MESSAGES_ACTION: &str = "push_messages";

/// Default path for event creation, relative to the service root.
pub const DEFAULT_EVENTS_PATH: &str = "events";
/// Default path for observation posts, relative to the service root.
pub const DEFAULT_OBSERVATIONS_PATH: &str = "observations";
/// Default path for message posts, relative to the service root.
pub const DEFAULT_MESSAGES_PATH: &str = "messages";
/// Default path for legacy camera trap reports, relative to the service root.
pub const DEFAULT_CAMERA_TRAP_PATH: &str = "sensors/camera-trap/{provider_key}/status";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Integration setup errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrationError {
    /// The `auth` action configuration is absent.
    #[error("authentication settings for integration {0} are missing")]
    MissingAuth(String),
    /// The `auth` action configuration does not parse or carries no credentials.
    #[error("invalid authentication settings for integration {integration}: {reason}")]
    InvalidAuth {
        /// Integration id.
        integration: String,
        /// Failure reason.
        reason: String,
    },
}

// ============================================================================
// SECTION: Integration Model
// ============================================================================

/// Reference to an integration action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    /// Action identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Action kind (`auth`, `push`, `pull`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Action value used for lookups.
    pub value: String,
}

/// Configuration data bound to one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfiguration {
    /// Configuration identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Action this configuration applies to.
    pub action: ActionRef,
    /// Action-specific settings.
    #[serde(default)]
    pub data: Value,
}

/// Integration type reference (for example `earth_ranger` or `bidtrack`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationType {
    /// Type identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type slug.
    pub value: String,
}

/// Destination integration details.
///
/// # Invariants
/// - One instance per `destination_id`; reused only through the cache.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationIntegration {
    /// Integration id (equals the destination id).
    pub id: DestinationId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Destination site URL.
    pub base_url: String,
    /// Integration type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<IntegrationType>,
    /// Whether the integration is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-action configuration entries.
    #[serde(default)]
    pub configurations: Vec<IntegrationConfiguration>,
    /// Additional portal metadata.
    #[serde(default)]
    pub additional: Map<String, Value>,
}

/// Serde default for [`DestinationIntegration::enabled`].
const fn default_enabled() -> bool {
    true
}

impl fmt::Debug for DestinationIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> =
            self.configurations.iter().map(|config| config.action.value.as_str()).collect();
        f.debug_struct("DestinationIntegration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("type", &self.type_slug())
            .field("enabled", &self.enabled)
            .field("actions", &actions)
            .finish_non_exhaustive()
    }
}

impl DestinationIntegration {
    /// Returns the integration type slug, when the portal sent one.
    #[must_use]
    pub fn type_slug(&self) -> Option<&str> {
        self.integration_type.as_ref().map(|kind| kind.value.as_str()).filter(|slug| !slug.is_empty())
    }

    /// Returns the configuration bound to `action_value`, if any.
    #[must_use]
    pub fn find_config_for_action(&self, action_value: &str) -> Option<&IntegrationConfiguration> {
        self.configurations.iter().find(|config| config.action.value == action_value)
    }

    /// Returns the authentication settings.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError`] when the `auth` action is missing or unusable.
    pub fn auth_config(&self) -> Result<AuthActionConfig, IntegrationError> {
        let config = self
            .find_config_for_action(AUTH_ACTION)
            .ok_or_else(|| IntegrationError::MissingAuth(self.id.to_string()))?;
        let auth: AuthActionConfig =
            serde_json::from_value(config.data.clone()).map_err(|err| {
                IntegrationError::InvalidAuth {
                    integration: self.id.to_string(),
                    reason: err.to_string(),
                }
            })?;
        if auth.token.is_none() && (auth.username.is_none() || auth.password.is_none()) {
            return Err(IntegrationError::InvalidAuth {
                integration: self.id.to_string(),
                reason: "token or username/password required".to_string(),
            });
        }
        Ok(auth)
    }

    /// Returns endpoint paths, applying any `push_*` overrides.
    #[must_use]
    pub fn push_endpoints(&self) -> PushEndpoints {
        let mut endpoints = PushEndpoints::default();
        if let Some(path) = self.action_path(PUSH_EVENTS_ACTION) {
            endpoints.events = path;
        }
        if let Some(path) = self.action_path(PUSH_OBSERVATIONS_ACTION) {
            endpoints.observations = path;
        }
        if let Some(path) = self.action_path(PUSH_MESSAGES_ACTION) {
            endpoints.messages = path;
        }
        endpoints
    }

    /// Reads the `path` setting of an action, when present and non-empty.
    fn action_path(&self, action_value: &str) -> Option<String> {
        self.find_config_for_action(action_value)
            .and_then(|config| config.data.get("path"))
            .and_then(Value::as_str)
            .map(|path| path.trim().trim_matches('/').to_string())
            .filter(|path| !path.is_empty())
    }
}

// ============================================================================
// SECTION: Auth Settings
// ============================================================================

/// Settings of the `auth` action.
///
/// # Invariants
/// - Either `token` or both `username` and `password` are present after
///   [`DestinationIntegration::auth_config`] succeeds.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AuthActionConfig {
    /// Static bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Username for the password grant.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for the password grant.
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for AuthActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthActionConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// SECTION: Push Endpoints
// ============================================================================

/// Endpoint paths relative to the destination service root.
///
/// # Invariants
/// - Paths carry no leading or trailing slash.
/// - `{provider_key}` in the observations and camera trap paths is substituted per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEndpoints {
    /// Event collection path.
    pub events: String,
    /// Observation path.
    pub observations: String,
    /// Message path.
    pub messages: String,
    /// Legacy camera trap report path.
    pub camera_trap: String,
}

impl Default for PushEndpoints {
    fn default() -> Self {
        Self {
            events: DEFAULT_EVENTS_PATH.to_string(),
            observations: DEFAULT_OBSERVATIONS_PATH.to_string(),
            messages: DEFAULT_MESSAGES_PATH.to_string(),
            camera_trap: DEFAULT_CAMERA_TRAP_PATH.to_string(),
        }
    }
}

impl PushEndpoints {
    /// Path of a single event.
    #[must_use]
    pub fn event(&self, external_id: &str) -> String {
        format!("{}/{external_id}", self.events)
    }

    /// Path of an event's attachment collection.
    #[must_use]
    pub fn event_attachments(&self, external_id: &str) -> String {
        format!("{}/{external_id}/attachments", self.events)
    }

    /// Observation path for the given provider key.
    #[must_use]
    pub fn observations_for(&self, provider_key: &str) -> String {
        self.observations.replace("{provider_key}", provider_key)
    }

    /// Camera trap report path for the given provider key.
    #[must_use]
    pub fn camera_trap_for(&self, provider_key: &str) -> String {
        self.camera_trap.replace("{provider_key}", provider_key)
    }
}
