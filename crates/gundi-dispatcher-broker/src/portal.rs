// crates/gundi-dispatcher-broker/src/portal.rs
// ============================================================================
// Module: Gundi Dispatcher Portal Client
// Description: HTTP client for integration details and delivery traces.
// Purpose: Implement the portal-backed collaborator traits over reqwest.
// Dependencies: gundi-dispatcher-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! [`PortalClient`] fetches `integrations/{id}/` and `traces/` from the Gundi
//! portal API.
//! Invariants:
//! - Base URL is normalized without a trailing slash.
//! - `404` on integration lookups means "no integration", not an error.
//! - Trace lookups return the first trace only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DestinationIntegration;
use gundi_dispatcher_core::DispatchTrace;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::IntegrationSource;
use gundi_dispatcher_core::PortalError;
use gundi_dispatcher_core::TraceSource;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

// ============================================================================
// SECTION: Portal Client
// ============================================================================

/// Gundi portal API client.
///
/// # Invariants
/// - Base URL is normalized without a trailing slash.
pub struct PortalClient {
    /// API base URL (no trailing slash).
    base_url: String,
    /// Optional bearer token.
    token: Option<String>,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    /// Builds a portal client.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Transport`] when the HTTP client cannot be built.
    pub fn new(
        mut base_url: String,
        token: Option<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, PortalError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|err| PortalError::Transport(err.to_string()))?;
        let trimmed_len = base_url.trim_end_matches('/').len();
        base_url.truncate(trimmed_len);
        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// Issues a GET and returns the status plus body text.
    async fn get(&self, url: Url) -> Result<(StatusCode, String), PortalError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|err| PortalError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| PortalError::Transport(err.to_string()))?;
        Ok((status, body))
    }

    /// Joins a relative path onto the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, PortalError> {
        Url::parse(&format!("{}/{path}", self.base_url))
            .map_err(|err| PortalError::Transport(format!("invalid portal url: {err}")))
    }
}

#[async_trait]
impl IntegrationSource for PortalClient {
    async fn integration_details(
        &self,
        destination_id: &DestinationId,
    ) -> Result<Option<DestinationIntegration>, PortalError> {
        let url = self.endpoint(&format!("integrations/{destination_id}/"))?;
        let (status, body) = self.get(url).await?;
        match status {
            StatusCode::OK => serde_json::from_str(&body)
                .map(Some)
                .map_err(|err| PortalError::Decode(err.to_string())),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(PortalError::Status {
                status_code: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl TraceSource for PortalClient {
    async fn find_trace(
        &self,
        gundi_id: &GundiId,
        destination_id: &DestinationId,
    ) -> Result<Option<DispatchTrace>, PortalError> {
        let mut url = self.endpoint("traces/")?;
        url.query_pairs_mut()
            .append_pair("object_id", gundi_id.as_str())
            .append_pair("destination", destination_id.as_str());
        let (status, body) = self.get(url).await?;
        if status != StatusCode::OK {
            return Err(PortalError::Status {
                status_code: status.as_u16(),
                body,
            });
        }
        let value: Value =
            serde_json::from_str(&body).map_err(|err| PortalError::Decode(err.to_string()))?;
        let first = match value {
            Value::Array(mut items) => {
                if items.is_empty() {
                    None
                } else {
                    Some(items.swap_remove(0))
                }
            }
            Value::Object(mut page) => match page.remove("results") {
                Some(Value::Array(mut items)) if !items.is_empty() => Some(items.swap_remove(0)),
                _ => None,
            },
            _ => None,
        };
        first
            .map(|trace| serde_json::from_value(trace).map_err(|err| PortalError::Decode(err.to_string())))
            .transpose()
    }
}
