// crates/gundi-dispatcher-broker/src/destination/client.rs
// ============================================================================
// Module: Gundi Dispatcher Destination HTTP Client
// Description: reqwest client for the destination platform REST API.
// Purpose: Perform event, attachment, observation and message calls with structured errors.
// Dependencies: gundi-dispatcher-core, reqwest, serde_json, tokio, url
// ============================================================================

//! ## Overview
//! [`HttpDestinationClient`] is bound to one destination service root and
//! provider key. Every non-success response becomes a [`DeliveryError`]
//! carrying the status code and raw body.
//! Invariants:
//! - Requests are resent only when the connection was never established.
//! - Password credentials are exchanged for a token once per client.
//! - Credentials never appear in `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use gundi_dispatcher_core::BlobFile;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::ExternalId;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::PushEndpoints;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::header::ACCEPT;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// OAuth client id used for the password grant.
pub const TOKEN_CLIENT_ID: &str = "das_web_client";

/// Multipart field name for attachment and camera trap uploads.
const ATTACHMENT_FIELD: &str = "filecontent.file";

/// Maximum send attempts when the connection cannot be established.
const MAX_SEND_ATTEMPTS: u32 = 3;

/// Base delay between connection attempts.
const BASE_SEND_RETRY_DELAY_MS: u64 = 200;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Destination credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Static bearer token.
    Token(String),
    /// Username and password exchanged for a token.
    Password {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Password {
                username, ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    /// Issued bearer token.
    access_token: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Destination REST client bound to one service root and provider key.
pub struct HttpDestinationClient {
    /// Shared HTTP client.
    client: Client,
    /// Service root, for example `https://site.example.org/api/v1.0`.
    service_root: Url,
    /// OAuth token endpoint.
    token_url: Url,
    /// Credentials from the integration's auth action.
    credentials: Credentials,
    /// Provider key added to events and observations.
    provider_key: ProviderKey,
    /// Endpoint paths relative to the service root.
    endpoints: PushEndpoints,
    /// Token obtained through the password grant.
    token: Mutex<Option<String>>,
}

impl fmt::Debug for HttpDestinationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDestinationClient")
            .field("service_root", &self.service_root.as_str())
            .field("credentials", &self.credentials)
            .field("provider_key", &self.provider_key)
            .finish_non_exhaustive()
    }
}

impl HttpDestinationClient {
    /// Creates a client for the given service root.
    #[must_use]
    pub fn new(
        client: Client,
        service_root: Url,
        token_url: Url,
        credentials: Credentials,
        provider_key: ProviderKey,
        endpoints: PushEndpoints,
    ) -> Self {
        Self {
            client,
            service_root,
            token_url,
            credentials,
            provider_key,
            endpoints,
            token: Mutex::new(None),
        }
    }

    /// Returns the service root.
    #[must_use]
    pub const fn service_root(&self) -> &Url {
        &self.service_root
    }

    /// Returns the token endpoint.
    #[must_use]
    pub const fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Resolves an endpoint path against the service root.
    fn endpoint(&self, path: &str) -> Result<Url, DeliveryError> {
        let root = self.service_root.as_str().trim_end_matches('/');
        Url::parse(&format!("{root}/{}", path.trim_start_matches('/')))
            .map_err(|err| DeliveryError::Configuration(format!("invalid endpoint url: {err}")))
    }

    /// Returns a bearer token, running the password grant when needed.
    async fn bearer_token(&self) -> Result<String, DeliveryError> {
        let (username, password) = match &self.credentials {
            Credentials::Token(token) => return Ok(token.clone()),
            Credentials::Password {
                username,
                password,
            } => (username, password),
        };
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let form = [
            ("grant_type", "password"),
            ("username", username.as_str()),
            ("password", password.as_str()),
            ("client_id", TOKEN_CLIENT_ID),
        ];
        let response =
            send_with_retry(|| Ok(self.client.post(self.token_url.clone()).form(&form))).await?;
        let status = response.status();
        let body = response.text().await.map_err(|err| DeliveryError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(DeliveryError::from_status(status.as_u16(), body));
        }
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| DeliveryError::InvalidResponse(format!("token response: {err}")))?;
        *cached = Some(token.access_token.clone());
        drop(cached);
        Ok(token.access_token)
    }

    /// Adds the provider key to a JSON object body when absent.
    fn with_provider_key(&self, body: Value) -> Value {
        match body {
            Value::Object(mut map) => {
                map.entry("provider_key")
                    .or_insert_with(|| Value::String(self.provider_key.to_string()));
                Value::Object(map)
            }
            other => other,
        }
    }

    /// Sends a JSON request with the bearer token attached.
    async fn send_json(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &Value,
    ) -> Result<Value, DeliveryError> {
        let token = self.bearer_token().await?;
        let response = send_with_retry(|| {
            Ok(self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(&token)
                .header(ACCEPT, "application/json")
                .json(body))
        })
        .await?;
        read_response(response).await
    }
}

#[async_trait]
impl DestinationClient for HttpDestinationClient {
    async fn create_event(&self, event: Value) -> Result<Value, DeliveryError> {
        let url = self.endpoint(&self.endpoints.events)?;
        let body = self.with_provider_key(event);
        self.send_json(reqwest::Method::POST, url, &body).await
    }

    async fn patch_event(
        &self,
        external_id: &ExternalId,
        changes: Value,
    ) -> Result<Value, DeliveryError> {
        let url = self.endpoint(&self.endpoints.event(external_id.as_str()))?;
        self.send_json(reqwest::Method::PATCH, url, &changes).await
    }

    async fn post_event_attachment(
        &self,
        external_id: &ExternalId,
        file: &BlobFile,
    ) -> Result<Value, DeliveryError> {
        let url = self.endpoint(&self.endpoints.event_attachments(external_id.as_str()))?;
        let token = self.bearer_token().await?;
        let response = send_with_retry(|| {
            let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            Ok(self
                .client
                .post(url.clone())
                .bearer_auth(&token)
                .header(ACCEPT, "application/json")
                .multipart(Form::new().part(ATTACHMENT_FIELD, part)))
        })
        .await?;
        read_response(response).await
    }

    async fn post_observation(&self, observation: Value) -> Result<Value, DeliveryError> {
        let url = self.endpoint(&self.endpoints.observations_for(self.provider_key.as_str()))?;
        let body = self.with_provider_key(observation);
        self.send_json(reqwest::Method::POST, url, &body).await
    }

    async fn post_message(
        &self,
        manufacturer_id: &str,
        message: Value,
    ) -> Result<Value, DeliveryError> {
        let mut url = self.endpoint(&self.endpoints.messages)?;
        url.query_pairs_mut().append_pair("manufacturer_id", manufacturer_id);
        self.send_json(reqwest::Method::POST, url, &message).await
    }

    async fn post_camera_trap_report(
        &self,
        report: Value,
        file: &BlobFile,
    ) -> Result<Value, DeliveryError> {
        let url = self.endpoint(&self.endpoints.camera_trap_for(self.provider_key.as_str()))?;
        let Value::Object(fields) = report else {
            return Err(DeliveryError::InvalidPayload("camera trap report must be an object".to_string()));
        };
        let token = self.bearer_token().await?;
        let response = send_with_retry(|| {
            let form = fields.iter().fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), form_text(value))
            });
            let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            Ok(self
                .client
                .post(url.clone())
                .bearer_auth(&token)
                .header(ACCEPT, "application/json")
                .multipart(form.part(ATTACHMENT_FIELD, part)))
        })
        .await?;
        read_response(response).await
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sends a request, rebuilding and resending it while the connection fails.
async fn send_with_retry<F>(build: F) -> Result<Response, DeliveryError>
where
    F: Fn() -> Result<RequestBuilder, DeliveryError>,
{
    let mut attempt = 1;
    loop {
        match build()?.send().await {
            Ok(response) => return Ok(response),
            Err(err) if should_retry_send(&err, attempt) => {
                tracing::debug!(attempt, error = %err, "destination connection failed; retrying");
                tokio::time::sleep(retry_delay_for_attempt(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(DeliveryError::Transport(err.to_string())),
        }
    }
}

/// Returns true when the request never reached the destination.
fn should_retry_send(err: &reqwest::Error, attempt: u32) -> bool {
    attempt < MAX_SEND_ATTEMPTS && err.is_connect()
}

/// Linear backoff between connection attempts.
fn retry_delay_for_attempt(attempt: u32) -> Duration {
    Duration::from_millis(u64::from(attempt) * BASE_SEND_RETRY_DELAY_MS)
}

/// Renders a JSON value as a multipart text field; strings are sent unquoted.
fn form_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Maps a response to its unwrapped JSON body or a structured error.
async fn read_response(response: Response) -> Result<Value, DeliveryError> {
    let status = response.status();
    let body = response.text().await.map_err(|err| DeliveryError::Transport(err.to_string()))?;
    if !status.is_success() {
        return Err(DeliveryError::from_status(status.as_u16(), body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value: Value =
        serde_json::from_str(&body).map_err(|err| DeliveryError::InvalidResponse(err.to_string()))?;
    Ok(unwrap_data(value))
}

/// Unwraps `{"data": .., "status": ..}` response envelopes.
pub(crate) fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.contains_key("data") && map.keys().all(|key| key == "data" || key == "status") =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
