// crates/gundi-dispatcher-broker/src/destination/mod.rs
// ============================================================================
// Module: Gundi Dispatcher Destination Connector
// Description: Builds destination clients from integration details.
// Purpose: Derive service roots and credentials from portal configuration.
// Dependencies: gundi-dispatcher-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpDestinationConnector`] turns a [`DestinationIntegration`] into an
//! [`HttpDestinationClient`].
//! Invariants:
//! - `http` base URLs are upgraded to `https` for the service root.
//! - The service root is `{scheme}://{host[:port]}/api/v1.0`.
//! - The token endpoint is `{original scheme}://{host}/oauth2/token`.
//! - Missing auth settings are configuration errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::DestinationConnector;
use gundi_dispatcher_core::DestinationIntegration;
use gundi_dispatcher_core::ProviderKey;
use reqwest::Client;
use url::Url;

pub use self::client::Credentials;
pub use self::client::HttpDestinationClient;
pub use self::client::TOKEN_CLIENT_ID;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// API path appended to the destination host.
pub const SERVICE_ROOT_PATH: &str = "api/v1.0";

/// Token endpoint path.
pub const TOKEN_PATH: &str = "oauth2/token";

// ============================================================================
// SECTION: URL Derivation
// ============================================================================

/// Service and token URLs for a destination site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationUrls {
    /// REST service root.
    pub service_root: Url,
    /// OAuth token endpoint.
    pub token_url: Url,
}

impl DestinationUrls {
    /// Derives URLs from a destination base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Configuration`] when the base URL has no host.
    pub fn from_base_url(base_url: &str) -> Result<Self, DeliveryError> {
        let parsed = Url::parse(base_url.trim()).map_err(|err| {
            DeliveryError::Configuration(format!("invalid destination base url: {err}"))
        })?;
        let host = parsed.host_str().ok_or_else(|| {
            DeliveryError::Configuration("destination base url has no host".to_string())
        })?;
        let netloc = parsed.port().map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        let service_scheme = if parsed.scheme() == "http" { "https" } else { parsed.scheme() };
        let service_root = Url::parse(&format!("{service_scheme}://{netloc}/{SERVICE_ROOT_PATH}"))
            .map_err(|err| DeliveryError::Configuration(err.to_string()))?;
        let token_url = Url::parse(&format!("{}://{host}/{TOKEN_PATH}", parsed.scheme()))
            .map_err(|err| DeliveryError::Configuration(err.to_string()))?;
        Ok(Self {
            service_root,
            token_url,
        })
    }
}

// ============================================================================
// SECTION: Connector
// ============================================================================

/// Connector producing [`HttpDestinationClient`] instances.
#[derive(Debug, Clone)]
pub struct HttpDestinationConnector {
    /// Shared HTTP client configured with timeouts.
    client: Client,
}

impl HttpDestinationConnector {
    /// Builds a connector with connect and read timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Configuration`] when the HTTP client cannot be built.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|err| DeliveryError::Configuration(err.to_string()))?;
        Ok(Self {
            client,
        })
    }

    /// Creates a connector from an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

impl DestinationConnector for HttpDestinationConnector {
    fn connect(
        &self,
        integration: &DestinationIntegration,
        provider_key: &ProviderKey,
    ) -> Result<Arc<dyn DestinationClient>, DeliveryError> {
        let auth =
            integration.auth_config().map_err(|err| DeliveryError::Configuration(err.to_string()))?;
        let credentials = match (auth.token, auth.username, auth.password) {
            (Some(token), _, _) => Credentials::Token(token),
            (None, Some(username), Some(password)) => Credentials::Password {
                username,
                password,
            },
            _ => {
                return Err(DeliveryError::Configuration(format!(
                    "authentication settings for integration {} are missing",
                    integration.id
                )));
            }
        };
        let urls = DestinationUrls::from_base_url(&integration.base_url)?;
        Ok(Arc::new(HttpDestinationClient::new(
            self.client.clone(),
            urls.service_root,
            urls.token_url,
            credentials,
            provider_key.clone(),
            integration.push_endpoints(),
        )))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
