// crates/gundi-dispatcher-broker/src/integrations.rs
// ============================================================================
// Module: Gundi Dispatcher Integration Resolver
// Description: Cached destination integration lookups.
// Purpose: Resolve destination configuration with a short-lived cache in front of the portal.
// Dependencies: gundi-dispatcher-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`IntegrationResolver`] reads `integration_details.{destination_id}` from
//! the cache and falls back to the portal. Legacy `v1` messages carry no
//! provider key; theirs is the type slug of the data provider integration,
//! resolved through the same lookup.
//! Invariants:
//! - Unparsable cached values are ignored and replaced from the portal.
//! - Absent integrations are never cached.
//! - Cache failures are absorbed; portal failures propagate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use gundi_dispatcher_core::CacheBackend;
use gundi_dispatcher_core::DataProviderId;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DestinationIntegration;
use gundi_dispatcher_core::IntegrationSource;
use gundi_dispatcher_core::PortalError;
use gundi_dispatcher_core::ProviderKey;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache key prefix for integration details.
pub const INTEGRATION_KEY_PREFIX: &str = "integration_details";

/// Default integration details TTL.
pub const DEFAULT_INTEGRATION_TTL: Duration = Duration::from_secs(60);

/// Returns the cache key for a destination's integration details.
#[must_use]
pub fn integration_key(destination_id: &DestinationId) -> String {
    format!("{INTEGRATION_KEY_PREFIX}.{destination_id}")
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Cached integration lookups.
pub struct IntegrationResolver {
    /// Portal lookup.
    source: Arc<dyn IntegrationSource>,
    /// Cache in front of the portal.
    cache: Arc<dyn CacheBackend>,
    /// Cache TTL.
    ttl: Duration,
}

impl IntegrationResolver {
    /// Creates a resolver with the default TTL.
    #[must_use]
    pub fn new(source: Arc<dyn IntegrationSource>, cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            source,
            cache,
            ttl: DEFAULT_INTEGRATION_TTL,
        }
    }

    /// Overrides the cache TTL.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolves integration details for a destination.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the portal lookup fails.
    pub async fn resolve(
        &self,
        destination_id: &DestinationId,
    ) -> Result<Option<DestinationIntegration>, PortalError> {
        let key = integration_key(destination_id);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<DestinationIntegration>(&raw) {
                Ok(integration) => return Ok(Some(integration)),
                Err(err) => {
                    tracing::warn!(
                        destination_id = %destination_id,
                        error = %err,
                        "cached integration details are unreadable; refetching",
                    );
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    destination_id = %destination_id,
                    error = %err,
                    "integration cache read failed; refetching",
                );
            }
        }
        let Some(integration) = self.source.integration_details(destination_id).await? else {
            return Ok(None);
        };
        match serde_json::to_string(&integration) {
            Ok(value) => {
                if let Err(err) = self.cache.set_ex(&key, &value, self.ttl).await {
                    tracing::warn!(
                        destination_id = %destination_id,
                        error = %err,
                        "integration cache write failed",
                    );
                }
            }
            Err(err) => {
                tracing::warn!(destination_id = %destination_id, error = %err, "integration not serializable");
            }
        }
        Ok(Some(integration))
    }

    /// Resolves the provider key of a data provider from its integration type.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the portal lookup fails.
    pub async fn provider_key_for(
        &self,
        data_provider_id: &DataProviderId,
    ) -> Result<Option<ProviderKey>, PortalError> {
        let integration = self.resolve(&DestinationId::new(data_provider_id.as_str())).await?;
        Ok(integration.as_ref().and_then(|integration| integration.type_slug()).map(ProviderKey::new))
    }
}
