// crates/gundi-dispatcher-server/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: In-memory collaborators and a running push endpoint.
// Purpose: Exercise the HTTP surface without external services.
// Dependencies: gundi-dispatcher-broker, gundi-dispatcher-server, reqwest, tokio
// ============================================================================

#![allow(
    dead_code,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gundi_dispatcher_broker::ChannelPublisher;
use gundi_dispatcher_broker::DeliveryCache;
use gundi_dispatcher_broker::Dispatcher;
use gundi_dispatcher_broker::IntegrationResolver;
use gundi_dispatcher_broker::MemoryBlobStore;
use gundi_dispatcher_broker::MemoryCacheBackend;
use gundi_dispatcher_broker::MessageProcessor;
use gundi_dispatcher_broker::PublishedMessage;
use gundi_dispatcher_broker::StrategyRegistry;
use gundi_dispatcher_broker::SystemEventPublisher;
use gundi_dispatcher_core::BlobFile;
use gundi_dispatcher_core::Clock;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::DestinationConnector;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DestinationIntegration;
use gundi_dispatcher_core::ExternalId;
use gundi_dispatcher_core::FixedClock;
use gundi_dispatcher_core::IntegrationSource;
use gundi_dispatcher_core::PortalError;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::Timestamp;
use gundi_dispatcher_server::AppState;
use gundi_dispatcher_server::router;
use gundi_dispatcher_server::serve;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const DESTINATION: &str = "338225f3-91f9-4fe1-b013-353a229ce504";
pub const NOW: &str = "2024-05-01T12:00:00Z";
pub const EVENTS_TOPIC: &str = "dispatcher-events";
pub const DEAD_LETTER_TOPIC: &str = "dispatcher-dead-letter";

// ============================================================================
// SECTION: Fakes
// ============================================================================

/// Serves a single known integration.
pub struct OneIntegration(pub DestinationIntegration);

#[async_trait]
impl IntegrationSource for OneIntegration {
    async fn integration_details(
        &self,
        destination_id: &DestinationId,
    ) -> Result<Option<DestinationIntegration>, PortalError> {
        Ok((self.0.id == *destination_id).then(|| self.0.clone()))
    }
}

/// Records created events and answers with a fixed id.
#[derive(Default)]
pub struct EventSink {
    pub events: Mutex<Vec<Value>>,
}

#[async_trait]
impl DestinationClient for EventSink {
    async fn create_event(&self, event: Value) -> Result<Value, DeliveryError> {
        self.events.lock().unwrap().push(event);
        Ok(json!({"id": "er-event-1"}))
    }

    async fn patch_event(
        &self,
        _external_id: &ExternalId,
        changes: Value,
    ) -> Result<Value, DeliveryError> {
        Ok(changes)
    }

    async fn post_event_attachment(
        &self,
        _external_id: &ExternalId,
        _file: &BlobFile,
    ) -> Result<Value, DeliveryError> {
        Ok(Value::Null)
    }

    async fn post_observation(&self, observation: Value) -> Result<Value, DeliveryError> {
        Ok(observation)
    }

    async fn post_message(
        &self,
        _manufacturer_id: &str,
        message: Value,
    ) -> Result<Value, DeliveryError> {
        Ok(message)
    }

    async fn post_camera_trap_report(
        &self,
        report: Value,
        _file: &BlobFile,
    ) -> Result<Value, DeliveryError> {
        Ok(report)
    }
}

pub struct SinkConnector(pub Arc<EventSink>);

impl DestinationConnector for SinkConnector {
    fn connect(
        &self,
        _integration: &DestinationIntegration,
        _provider_key: &ProviderKey,
    ) -> Result<Arc<dyn DestinationClient>, DeliveryError> {
        let client: Arc<dyn DestinationClient> = self.0.clone();
        Ok(client)
    }
}

// ============================================================================
// SECTION: Running Endpoint
// ============================================================================

pub struct TestServer {
    pub base_url: String,
    pub sink: Arc<EventSink>,
    pub events: Receiver<PublishedMessage>,
    pub dead_letters: Receiver<PublishedMessage>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Starts the push endpoint on an ephemeral port.
    pub async fn start() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Timestamp::parse_rfc3339(NOW).unwrap()));
        let cache = Arc::new(MemoryCacheBackend::new());
        let sink = Arc::new(EventSink::default());
        let integration: DestinationIntegration = serde_json::from_value(json!({
            "id": DESTINATION,
            "name": "EarthRanger Test Site",
            "base_url": "https://site.example.org",
            "enabled": true,
            "configurations": [
                {"action": {"type": "auth", "value": "auth"}, "data": {"token": "er-token"}}
            ]
        }))
        .unwrap();
        let (events_tx, events) = mpsc::channel(16);
        let (dead_tx, dead_letters) = mpsc::channel(16);
        let dispatcher = Dispatcher::new(
            IntegrationResolver::new(Arc::new(OneIntegration(integration)), cache.clone()),
            DeliveryCache::new(cache, Arc::clone(&clock)),
            StrategyRegistry::with_defaults(Arc::new(MemoryBlobStore::new())),
            Arc::new(SinkConnector(Arc::clone(&sink))),
            SystemEventPublisher::new(Arc::new(ChannelPublisher::new(events_tx)), EVENTS_TOPIC),
            Arc::clone(&clock),
        );
        let processor = MessageProcessor::new(
            dispatcher,
            Arc::new(ChannelPublisher::new(dead_tx)),
            DEAD_LETTER_TOPIC,
            clock,
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(AppState::new(processor), 1024 * 1024);
        let handle = tokio::spawn(async move {
            serve(listener, app, async move {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
        });
        Self {
            base_url,
            sink,
            events,
            dead_letters,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stops the server and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

// ============================================================================
// SECTION: Message Builders
// ============================================================================

pub fn push_body(destination: &str) -> Value {
    let payload = json!({
        "title": "Animal Detected",
        "event_type": "lion_sighting",
        "time": "2024-05-01T11:58:00Z",
        "location": {"latitude": 13.688635, "longitude": 13.783064},
        "event_details": {"species": "lion"}
    });
    let attributes = BTreeMap::from([
        ("gundi_version", "v2"),
        ("gundi_id", "5b793d17-cd79-49c8-abaa-712cb40f2b54"),
        ("related_to", "None"),
        ("stream_type", "ev"),
        ("source_id", "ac1b9cdc-a193-4515-b446-b177bcc5f342"),
        ("external_source_id", "camera-123"),
        ("destination_id", destination),
        ("data_provider_id", "ddd0946d-15b0-4308-b93d-e0470b6d33b6"),
        ("provider_key", "gundi_traptagger_d88ac520"),
    ]);
    json!({
        "message": {
            "data": STANDARD.encode(serde_json::to_vec(&payload).unwrap()),
            "attributes": attributes,
            "messageId": "11111111",
            "publishTime": NOW
        },
        "subscription": "projects/gundi/subscriptions/dispatcher"
    })
}
