// crates/gundi-dispatcher-broker/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fakes and harness for gundi-dispatcher-broker tests.
// Purpose: Wire a message processor over in-memory collaborators.
// Dependencies: gundi-dispatcher-broker, gundi-dispatcher-core, base64, tiny_http, tokio
// ============================================================================

//! ## Overview
//! Provides a recording destination, static portal sources, channel-backed
//! publishers and a [`Harness`] wiring them into a [`MessageProcessor`].

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
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;

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
use gundi_dispatcher_broker::QueueMessage;
use gundi_dispatcher_broker::RetryPolicy;
use gundi_dispatcher_broker::StrategyRegistry;
use gundi_dispatcher_broker::SystemEventPublisher;
use gundi_dispatcher_core::BlobFile;
use gundi_dispatcher_core::CacheBackend;
use gundi_dispatcher_core::CacheError;
use gundi_dispatcher_core::Clock;
use gundi_dispatcher_core::DeliveryError;
use gundi_dispatcher_core::DestinationClient;
use gundi_dispatcher_core::DestinationConnector;
use gundi_dispatcher_core::DestinationId;
use gundi_dispatcher_core::DestinationIntegration;
use gundi_dispatcher_core::DispatchTrace;
use gundi_dispatcher_core::ExternalId;
use gundi_dispatcher_core::FixedClock;
use gundi_dispatcher_core::GundiId;
use gundi_dispatcher_core::IntegrationSource;
use gundi_dispatcher_core::MessagePublisher;
use gundi_dispatcher_core::OutboundMessage;
use gundi_dispatcher_core::PublishError;
use gundi_dispatcher_core::PortalError;
use gundi_dispatcher_core::ProviderKey;
use gundi_dispatcher_core::Timestamp;
use gundi_dispatcher_core::TraceSource;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;

// ============================================================================
// SECTION: Constants
// ============================================================================

pub type TestResult = Result<(), String>;

pub const DESTINATION: &str = "338225f3-91f9-4fe1-b013-353a229ce504";
pub const DATA_PROVIDER: &str = "ddd0946d-15b0-4308-b93d-e0470b6d33b6";
pub const PROVIDER_KEY: &str = "gundi_traptagger_d88ac520";
pub const EVENTS_TOPIC: &str = "dispatcher-events";
pub const DEAD_LETTER_TOPIC: &str = "dispatcher-dead-letter";
pub const NOW: &str = "2024-05-01T12:00:00Z";

pub fn now() -> Timestamp {
    Timestamp::parse_rfc3339(NOW).unwrap()
}

// ============================================================================
// SECTION: Integrations
// ============================================================================

/// Data provider integration typed `bidtrack`, used by `v1` messages.
pub fn data_provider_integration() -> DestinationIntegration {
    serde_json::from_value(json!({
        "id": DATA_PROVIDER,
        "name": "BidTrack Provider",
        "base_url": "https://bidtrack.example.org",
        "type": {"id": "b6a0c9e4-6d4e-4d3a-9c57-2b3f9c1e7a10", "name": "BidTrack", "value": "bidtrack"}
    }))
    .unwrap()
}

pub fn sample_integration(base_url: &str) -> DestinationIntegration {
    serde_json::from_value(json!({
        "id": DESTINATION,
        "name": "EarthRanger Test Site",
        "base_url": base_url,
        "enabled": true,
        "configurations": [
            {"action": {"type": "auth", "value": "auth"}, "data": {"token": "er-token"}}
        ]
    }))
    .unwrap()
}

#[derive(Default)]
pub struct StaticIntegrations {
    pub integrations: BTreeMap<String, DestinationIntegration>,
    pub calls: AtomicUsize,
}

impl StaticIntegrations {
    pub fn with(integration: DestinationIntegration) -> Self {
        let mut integrations = BTreeMap::new();
        integrations.insert(integration.id.to_string(), integration);
        Self {
            integrations,
            calls: AtomicUsize::new(0),
        }
    }

    /// Adds another integration keyed by its id.
    pub fn and(mut self, integration: DestinationIntegration) -> Self {
        self.integrations.insert(integration.id.to_string(), integration);
        self
    }
}

#[async_trait]
impl IntegrationSource for StaticIntegrations {
    async fn integration_details(
        &self,
        destination_id: &DestinationId,
    ) -> Result<Option<DestinationIntegration>, PortalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.integrations.get(destination_id.as_str()).cloned())
    }
}

#[derive(Default)]
pub struct StaticTraces {
    pub traces: Vec<DispatchTrace>,
    pub fail: bool,
}

#[async_trait]
impl TraceSource for StaticTraces {
    async fn find_trace(
        &self,
        gundi_id: &GundiId,
        destination_id: &DestinationId,
    ) -> Result<Option<DispatchTrace>, PortalError> {
        if self.fail {
            return Err(PortalError::Transport("portal unreachable".to_string()));
        }
        Ok(self
            .traces
            .iter()
            .find(|trace| {
                &trace.object_id == gundi_id && trace.destination.as_ref() == Some(destination_id)
            })
            .cloned())
    }
}

// ============================================================================
// SECTION: Failing Cache
// ============================================================================

/// Cache backend whose reads and writes always fail.
#[derive(Default)]
pub struct FailingCache {
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Connection("connection refused".to_string()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("READONLY replica".to_string()))
    }
}

// ============================================================================
// SECTION: Recording Destination
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateEvent(Value),
    PatchEvent(String, Value),
    Attachment(String, String, Vec<u8>),
    Observation(Value),
    Message(String, Value),
    CameraTrap(Value, String, Vec<u8>),
}

#[derive(Default)]
pub struct RecordingDestination {
    pub calls: Mutex<Vec<Call>>,
    pub responses: Mutex<VecDeque<Result<Value, DeliveryError>>>,
}

impl RecordingDestination {
    pub fn respond_with(&self, response: Result<Value, DeliveryError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<Value, DeliveryError> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"id": "er-default"})))
    }
}

#[async_trait]
impl DestinationClient for RecordingDestination {
    async fn create_event(&self, event: Value) -> Result<Value, DeliveryError> {
        self.record(Call::CreateEvent(event))
    }

    async fn patch_event(
        &self,
        external_id: &ExternalId,
        changes: Value,
    ) -> Result<Value, DeliveryError> {
        self.record(Call::PatchEvent(external_id.to_string(), changes))
    }

    async fn post_event_attachment(
        &self,
        external_id: &ExternalId,
        file: &BlobFile,
    ) -> Result<Value, DeliveryError> {
        self.record(Call::Attachment(external_id.to_string(), file.file_name.clone(), file.bytes.clone()))
    }

    async fn post_observation(&self, observation: Value) -> Result<Value, DeliveryError> {
        self.record(Call::Observation(observation))
    }

    async fn post_message(
        &self,
        manufacturer_id: &str,
        message: Value,
    ) -> Result<Value, DeliveryError> {
        self.record(Call::Message(manufacturer_id.to_string(), message))
    }

    async fn post_camera_trap_report(
        &self,
        report: Value,
        file: &BlobFile,
    ) -> Result<Value, DeliveryError> {
        self.record(Call::CameraTrap(report, file.file_name.clone(), file.bytes.clone()))
    }
}

pub struct RecordingConnector {
    pub destination: Arc<RecordingDestination>,
    pub provider_keys: Mutex<Vec<String>>,
}

impl DestinationConnector for RecordingConnector {
    fn connect(
        &self,
        _integration: &DestinationIntegration,
        provider_key: &ProviderKey,
    ) -> Result<Arc<dyn DestinationClient>, DeliveryError> {
        self.provider_keys.lock().unwrap().push(provider_key.to_string());
        let client: Arc<dyn DestinationClient> = self.destination.clone();
        Ok(client)
    }
}

// ============================================================================
// SECTION: Flaky Publisher
// ============================================================================

/// Publisher failing the first `failures` attempts with `error`.
pub struct FlakyPublisher {
    pub failures: usize,
    pub error: PublishError,
    pub attempts: AtomicUsize,
    pub accepted: Mutex<Vec<(String, OutboundMessage)>>,
}

impl FlakyPublisher {
    pub fn new(failures: usize, error: PublishError) -> Self {
        Self {
            failures,
            error,
            attempts: AtomicUsize::new(0),
            accepted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MessagePublisher for FlakyPublisher {
    async fn publish(&self, topic: &str, message: &OutboundMessage) -> Result<(), PublishError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(self.error.clone());
        }
        self.accepted.lock().unwrap().push((topic.to_string(), message.clone()));
        Ok(())
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

pub struct Harness {
    pub processor: MessageProcessor,
    pub cache: Arc<MemoryCacheBackend>,
    pub blobs: Arc<MemoryBlobStore>,
    pub destination: Arc<RecordingDestination>,
    pub connector: Arc<RecordingConnector>,
    pub integrations: Arc<StaticIntegrations>,
    pub events: Receiver<PublishedMessage>,
    pub dead_letters: Receiver<PublishedMessage>,
}

/// Optional collaborators replacing the harness defaults.
#[derive(Default)]
pub struct HarnessSetup {
    pub integrations: Option<StaticIntegrations>,
    pub traces: StaticTraces,
    pub cache: Option<Arc<dyn CacheBackend>>,
    pub events: Option<Arc<dyn MessagePublisher>>,
    pub dead_letters: Option<Arc<dyn MessagePublisher>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::assemble(HarnessSetup::default())
    }

    pub fn with_sources(integrations: StaticIntegrations, traces: StaticTraces) -> Self {
        Self::assemble(HarnessSetup {
            integrations: Some(integrations),
            traces,
            ..HarnessSetup::default()
        })
    }

    /// Builds a harness whose dead letters go to `dead_letters` instead of the channel.
    pub fn with_dead_letter_publisher(dead_letters: Arc<dyn MessagePublisher>) -> Self {
        Self::assemble(HarnessSetup {
            dead_letters: Some(dead_letters),
            ..HarnessSetup::default()
        })
    }

    /// Builds a harness whose system events go to `events` instead of the channel.
    pub fn with_event_publisher(events: Arc<dyn MessagePublisher>) -> Self {
        Self::assemble(HarnessSetup {
            events: Some(events),
            ..HarnessSetup::default()
        })
    }

    /// Builds a harness whose dispatch records and integrations live in `cache`.
    pub fn with_cache(cache: Arc<dyn CacheBackend>, traces: StaticTraces) -> Self {
        Self::assemble(HarnessSetup {
            traces,
            cache: Some(cache),
            ..HarnessSetup::default()
        })
    }

    /// Builds a harness that also knows the `v1` data provider integration.
    pub fn with_data_provider() -> Self {
        Self::with_sources(
            StaticIntegrations::with(sample_integration("https://site.example.org"))
                .and(data_provider_integration()),
            StaticTraces::default(),
        )
    }

    pub fn assemble(setup: HarnessSetup) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
        let cache = Arc::new(MemoryCacheBackend::new());
        let backend: Arc<dyn CacheBackend> = setup.cache.unwrap_or_else(|| cache.clone());
        let blobs = Arc::new(MemoryBlobStore::new());
        let destination = Arc::new(RecordingDestination::default());
        let connector = Arc::new(RecordingConnector {
            destination: Arc::clone(&destination),
            provider_keys: Mutex::new(Vec::new()),
        });
        let integrations = Arc::new(setup.integrations.unwrap_or_else(|| {
            StaticIntegrations::with(sample_integration("https://site.example.org"))
        }));
        let (events_tx, events) = mpsc::channel(64);
        let (dead_tx, dead_letters) = mpsc::channel(64);

        let records = DeliveryCache::new(Arc::clone(&backend), Arc::clone(&clock))
            .with_trace_source(Arc::new(setup.traces));
        let resolver = IntegrationResolver::new(integrations.clone(), backend);
        let event_publisher =
            setup.events.unwrap_or_else(|| Arc::new(ChannelPublisher::new(events_tx)));
        let dispatcher = Dispatcher::new(
            resolver,
            records,
            StrategyRegistry::with_defaults(blobs.clone()),
            connector.clone(),
            SystemEventPublisher::new(event_publisher, EVENTS_TOPIC)
                .with_policy(RetryPolicy::new(3, Duration::ZERO)),
            Arc::clone(&clock),
        );
        let dead_letter_publisher =
            setup.dead_letters.unwrap_or_else(|| Arc::new(ChannelPublisher::new(dead_tx)));
        let processor = MessageProcessor::new(dispatcher, dead_letter_publisher, DEAD_LETTER_TOPIC, clock)
            .with_retry_policy(RetryPolicy::new(3, Duration::ZERO));
        Self {
            processor,
            cache,
            blobs,
            destination,
            connector,
            integrations,
            events,
            dead_letters,
        }
    }

    /// Drains published system events as JSON.
    pub fn published_events(&mut self) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(published) = self.events.try_recv() {
            assert_eq!(published.topic, EVENTS_TOPIC);
            events.push(serde_json::from_slice(&published.message.data).unwrap());
        }
        events
    }

    /// Drains dead-lettered messages.
    pub fn published_dead_letters(&mut self) -> Vec<PublishedMessage> {
        let mut messages = Vec::new();
        while let Ok(published) = self.dead_letters.try_recv() {
            messages.push(published);
        }
        messages
    }
}

// ============================================================================
// SECTION: Message Builders
// ============================================================================

pub fn attributes(gundi_id: &str, stream_type: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("gundi_version".to_string(), "v2".to_string()),
        ("gundi_id".to_string(), gundi_id.to_string()),
        ("related_to".to_string(), "None".to_string()),
        ("stream_type".to_string(), stream_type.to_string()),
        ("source_id".to_string(), "ac1b9cdc-a193-4515-b446-b177bcc5f342".to_string()),
        ("external_source_id".to_string(), "camera-123".to_string()),
        ("destination_id".to_string(), DESTINATION.to_string()),
        ("data_provider_id".to_string(), DATA_PROVIDER.to_string()),
        ("provider_key".to_string(), PROVIDER_KEY.to_string()),
    ])
}

/// Legacy `v1` attributes routed to [`DESTINATION`] for [`DATA_PROVIDER`].
pub fn v1_attributes(observation_type: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("gundi_version".to_string(), "v1".to_string()),
        ("observation_type".to_string(), observation_type.to_string()),
        ("device_id".to_string(), "018910980".to_string()),
        ("outbound_config_id".to_string(), DESTINATION.to_string()),
        ("integration_id".to_string(), DATA_PROVIDER.to_string()),
    ])
}

pub fn queue_message(payload: &Value, attributes: BTreeMap<String, String>) -> QueueMessage {
    QueueMessage {
        data: STANDARD.encode(serde_json::to_vec(payload).unwrap()),
        attributes: Some(attributes),
        message_id: Some("11111111".to_string()),
        publish_time: Some(NOW.to_string()),
    }
}

pub fn event_payload() -> Value {
    json!({
        "title": "Animal Detected",
        "event_type": "lion_sighting",
        "time": "2024-05-01T11:58:00Z",
        "location": {"latitude": 13.688635, "longitude": 13.783064},
        "event_details": {"species": "lion"},
        "priority": null
    })
}

pub fn observation_payload(manufacturer_id: &str) -> Value {
    json!({
        "manufacturer_id": manufacturer_id,
        "source_type": "tracking-device",
        "subject_name": "Mariano",
        "recorded_at": "2024-05-01T11:55:00Z",
        "location": {"lat": -51.748, "lon": -72.720},
        "additional": {"speed_kmph": 5}
    })
}

// ============================================================================
// SECTION: Fake HTTP Server
// ============================================================================

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Serves scripted `(status, body)` responses, one per request, on a thread.
pub fn spawn_server(
    responses: Vec<(u16, String)>,
) -> (String, JoinHandle<Vec<CapturedRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let base_url = format!("http://{addr}");
    let handle = std::thread::spawn(move || {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                break;
            };
            let header = |name: &str| {
                request
                    .headers()
                    .iter()
                    .find(|header| header.field.to_string().eq_ignore_ascii_case(name))
                    .map(|header| header.value.to_string())
            };
            let authorization = header("Authorization");
            let content_type = header("Content-Type");
            let mut bytes = Vec::new();
            request.as_reader().read_to_end(&mut bytes).unwrap();
            captured.push(CapturedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                authorization,
                content_type,
                body: bytes,
            });
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            request.respond(response).unwrap();
        }
        captured
    });
    (base_url, handle)
}
