// crates/gundi-dispatcher-broker/src/publisher/pubsub.rs
// ============================================================================
// Module: Gundi Dispatcher Pub/Sub Publisher
// Description: Google Cloud Pub/Sub REST publisher.
// Purpose: Publish system events and dead-letters to Pub/Sub topics.
// Dependencies: base64, gundi-dispatcher-core, reqwest, serde
// ============================================================================

//! ## Overview
//! [`PubSubPublisher`] calls `POST {endpoint}/v1/projects/{project}/topics/{topic}:publish`
//! with one base64-encoded message per call.
//! Invariants:
//! - Transport failures, `429` and `5xx` are transient; other statuses are permanent.
//! - The access token never appears in `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gundi_dispatcher_core::MessagePublisher;
use gundi_dispatcher_core::OutboundMessage;
use gundi_dispatcher_core::PublishError;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Serialize;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Publish request body.
#[derive(Serialize)]
struct PublishRequest<'a> {
    /// Messages to publish.
    messages: [PubsubMessage<'a>; 1],
}

/// One Pub/Sub message.
#[derive(Serialize)]
struct PubsubMessage<'a> {
    /// Base64 body.
    data: String,
    /// Message attributes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: &'a BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Pub/Sub REST publisher.
///
/// # Invariants
/// - Endpoint is normalized without a trailing slash.
pub struct PubSubPublisher {
    /// HTTP client configured with a request timeout.
    client: Client,
    /// API endpoint (no trailing slash).
    endpoint: String,
    /// Project owning the topics.
    project_id: String,
    /// Optional OAuth access token.
    access_token: Option<String>,
}

impl fmt::Debug for PubSubPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSubPublisher")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl PubSubPublisher {
    /// Builds a publisher.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Permanent`] when the HTTP client cannot be built.
    pub fn new(
        mut endpoint: String,
        project_id: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PublishError::Permanent(err.to_string()))?;
        let trimmed_len = endpoint.trim_end_matches('/').len();
        endpoint.truncate(trimmed_len);
        Ok(Self {
            client,
            endpoint,
            project_id: project_id.into(),
            access_token,
        })
    }

    /// Returns the publish URL for a topic.
    #[must_use]
    pub fn topic_url(&self, topic: &str) -> String {
        format!("{}/v1/projects/{}/topics/{topic}:publish", self.endpoint, self.project_id)
    }
}

#[async_trait]
impl MessagePublisher for PubSubPublisher {
    async fn publish(&self, topic: &str, message: &OutboundMessage) -> Result<(), PublishError> {
        let body = PublishRequest {
            messages: [PubsubMessage {
                data: STANDARD.encode(&message.data),
                attributes: &message.attributes,
            }],
        };
        let mut request = self.client.post(self.topic_url(topic)).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response =
            request.send().await.map_err(|err| PublishError::Transient(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        let detail = format!("topic {topic} returned status {}: {text}", status.as_u16());
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(PublishError::Transient(detail))
        } else {
            Err(PublishError::Permanent(detail))
        }
    }
}
