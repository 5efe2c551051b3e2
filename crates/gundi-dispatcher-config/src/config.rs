// crates/gundi-dispatcher-config/src/config.rs
// ============================================================================
// Module: Gundi Dispatcher Configuration
// Description: Configuration loading and validation for the dispatcher.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults so an empty file is a valid local setup; any
//! value that is present is validated and rejected when out of bounds.
//! Invariants:
//! - Timeouts, TTLs, and retry budgets are bounded.
//! - URLs carry an explicit `http` or `https` scheme (`redis` for the cache).
//! - Credentials are never rendered by `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "gundi-dispatcher.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "GUNDI_DISPATCHER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum network timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum network timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Maximum cache TTL in seconds (seven days).
pub(crate) const MAX_CACHE_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
/// Maximum message age threshold in seconds (thirty days).
pub(crate) const MAX_EVENT_AGE_LIMIT_SECONDS: u64 = 30 * 24 * 60 * 60;
/// Maximum publish attempts.
pub(crate) const MAX_PUBLISH_ATTEMPTS: u32 = 10;
/// Maximum initial publish backoff in milliseconds.
pub(crate) const MAX_INITIAL_BACKOFF_MS: u64 = 10_000;
/// Minimum request body limit in bytes.
pub(crate) const MIN_MAX_BODY_BYTES: usize = 1024;
/// Maximum request body limit in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
/// Maximum length of a queue topic name.
pub(crate) const MAX_TOPIC_LENGTH: usize = 255;

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Gundi dispatcher service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GundiDispatcherConfig {
    /// Push endpoint configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Dispatch policy configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Delivery cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Configuration portal client settings.
    #[serde(default)]
    pub portal: PortalConfig,
    /// Destination platform client settings.
    #[serde(default)]
    pub destination: DestinationConfig,
    /// System event publisher settings.
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Attachment blob store settings.
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GundiDispatcherConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.dispatch.validate()?;
        self.cache.validate()?;
        self.portal.validate()?;
        self.destination.validate()?;
        self.publisher.validate()?;
        self.blob_store.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Push endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the push endpoint binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted push request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is not a socket address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if !(MIN_MAX_BODY_BYTES..=MAX_MAX_BODY_BYTES).contains(&self.max_body_bytes) {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between {MIN_MAX_BODY_BYTES} and {MAX_MAX_BODY_BYTES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Dispatch policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Messages older than this many seconds are dead-lettered.
    #[serde(default = "default_max_event_age_seconds")]
    pub max_event_age_seconds: u64,
    /// Topic receiving system events.
    #[serde(default = "default_dispatcher_events_topic")]
    pub dispatcher_events_topic: String,
    /// Topic receiving dead-lettered messages.
    #[serde(default = "default_dead_letter_topic")]
    pub dead_letter_topic: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_event_age_seconds: default_max_event_age_seconds(),
            dispatcher_events_topic: default_dispatcher_events_topic(),
            dead_letter_topic: default_dead_letter_topic(),
        }
    }
}

impl DispatchConfig {
    /// Returns the staleness threshold.
    #[must_use]
    pub const fn max_event_age(&self) -> Duration {
        Duration::from_secs(self.max_event_age_seconds)
    }

    /// Validates dispatch configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_event_age_seconds == 0
            || self.max_event_age_seconds > MAX_EVENT_AGE_LIMIT_SECONDS
        {
            return Err(ConfigError::Invalid(format!(
                "dispatch.max_event_age_seconds must be between 1 and {MAX_EVENT_AGE_LIMIT_SECONDS}"
            )));
        }
        validate_topic("dispatch.dispatcher_events_topic", &self.dispatcher_events_topic)?;
        validate_topic("dispatch.dead_letter_topic", &self.dead_letter_topic)?;
        if self.dispatcher_events_topic.trim() == self.dead_letter_topic.trim() {
            return Err(ConfigError::Invalid(
                "dispatch.dead_letter_topic must differ from dispatch.dispatcher_events_topic"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cache backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// Process-local map; entries do not survive restarts.
    #[default]
    Memory,
    /// Shared Redis server.
    Redis,
}

/// Delivery cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Redis connection URL (required for the redis backend).
    #[serde(default)]
    pub url: Option<String>,
    /// Optional key prefix applied by the backend.
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// TTL of dispatch records in seconds.
    #[serde(default = "default_dispatched_record_ttl_seconds")]
    pub dispatched_record_ttl_seconds: u64,
    /// TTL of cached integration details in seconds.
    #[serde(default = "default_integration_config_ttl_seconds")]
    pub integration_config_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            url: None,
            key_prefix: None,
            dispatched_record_ttl_seconds: default_dispatched_record_ttl_seconds(),
            integration_config_ttl_seconds: default_integration_config_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    /// Returns the dispatch record TTL.
    #[must_use]
    pub const fn dispatched_record_ttl(&self) -> Duration {
        Duration::from_secs(self.dispatched_record_ttl_seconds)
    }

    /// Returns the integration details TTL.
    #[must_use]
    pub const fn integration_config_ttl(&self) -> Duration {
        Duration::from_secs(self.integration_config_ttl_seconds)
    }

    /// Validates cache configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_ttl("cache.dispatched_record_ttl_seconds", self.dispatched_record_ttl_seconds)?;
        validate_ttl("cache.integration_config_ttl_seconds", self.integration_config_ttl_seconds)?;
        match self.backend {
            CacheBackendKind::Memory => {}
            CacheBackendKind::Redis => {
                let Some(url) = &self.url else {
                    return Err(ConfigError::Invalid(
                        "cache.url is required for the redis backend".to_string(),
                    ));
                };
                validate_url("cache.url", url, &["redis", "rediss"])?;
            }
        }
        if let Some(prefix) = &self.key_prefix {
            let trimmed = prefix.trim();
            if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "cache.key_prefix must be non-empty without whitespace".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Portal
// ============================================================================

/// Configuration portal client settings.
#[derive(Clone, Deserialize)]
pub struct PortalConfig {
    /// Portal API root (for example `https://api.gundiservice.org/api/v2`).
    #[serde(default = "default_portal_base_url")]
    pub base_url: String,
    /// Optional bearer token for portal requests.
    #[serde(default)]
    pub token: Option<String>,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_portal_base_url(),
            token: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .finish()
    }
}

impl PortalConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Validates portal configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url("portal.base_url", &self.base_url, &["http", "https"])?;
        validate_timeout("portal.connect_timeout_ms", self.connect_timeout_ms)?;
        validate_timeout("portal.read_timeout_ms", self.read_timeout_ms)?;
        if let Some(token) = &self.token
            && token.trim().is_empty()
        {
            return Err(ConfigError::Invalid("portal.token must be non-empty when set".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Destination
// ============================================================================

/// Destination platform client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl DestinationConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Validates destination configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("destination.connect_timeout_ms", self.connect_timeout_ms)?;
        validate_timeout("destination.read_timeout_ms", self.read_timeout_ms)
    }
}

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// System event publisher settings.
#[derive(Clone, Deserialize)]
pub struct PublisherConfig {
    /// Cloud project owning the topics.
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// Pub/Sub REST endpoint (an emulator URL is accepted).
    #[serde(default = "default_pubsub_endpoint")]
    pub endpoint: String,
    /// Optional OAuth access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Attempts per publish, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the second attempt in milliseconds; doubles per attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_publish_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            endpoint: default_pubsub_endpoint(),
            access_token: None,
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            timeout_ms: default_publish_timeout_ms(),
        }
    }
}

impl fmt::Debug for PublisherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl PublisherConfig {
    /// Returns the initial backoff.
    #[must_use]
    pub const fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates publisher configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let project = self.project_id.trim();
        if project.is_empty() || project.contains('/') {
            return Err(ConfigError::Invalid(
                "publisher.project_id must be non-empty without '/'".to_string(),
            ));
        }
        validate_url("publisher.endpoint", &self.endpoint, &["http", "https"])?;
        if self.max_attempts == 0 || self.max_attempts > MAX_PUBLISH_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "publisher.max_attempts must be between 1 and {MAX_PUBLISH_ATTEMPTS}"
            )));
        }
        if self.initial_backoff_ms > MAX_INITIAL_BACKOFF_MS {
            return Err(ConfigError::Invalid(format!(
                "publisher.initial_backoff_ms must be at most {MAX_INITIAL_BACKOFF_MS}"
            )));
        }
        validate_timeout("publisher.timeout_ms", self.timeout_ms)
    }
}

// ============================================================================
// SECTION: Blob Store
// ============================================================================

/// Attachment blob store settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    /// Process-local store; useful only for local runs.
    #[default]
    Memory,
    /// Files under a local or mounted directory.
    Directory(DirectoryBlobStoreConfig),
}

/// Directory-backed blob store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryBlobStoreConfig {
    /// Root directory; blob paths resolve beneath it.
    pub root: String,
}

impl BlobStoreConfig {
    /// Validates blob store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Memory => Ok(()),
            Self::Directory(config) => validate_path_string("blob_store.root", &config.root),
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of trace, debug, info, warn, error, off: {}",
                self.level
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a URL and its scheme.
fn validate_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::Invalid(format!(
            "{field} must use one of the schemes: {}",
            schemes.join(", ")
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    Ok(())
}

/// Validates a timeout in milliseconds.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Validates a cache TTL in seconds.
fn validate_ttl(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_CACHE_TTL_SECONDS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_CACHE_TTL_SECONDS}"
        )));
    }
    Ok(())
}

/// Validates a queue topic name.
fn validate_topic(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOPIC_LENGTH || trimmed.contains('/') {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a bare topic name of at most {MAX_TOPIC_LENGTH} characters"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default push endpoint bind address.
fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Default push request body limit.
const fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

/// Default staleness threshold (24 hours).
const fn default_max_event_age_seconds() -> u64 {
    86_400
}

/// Default system events topic.
fn default_dispatcher_events_topic() -> String {
    "dispatcher-events".to_string()
}

/// Default dead-letter topic.
fn default_dead_letter_topic() -> String {
    "dispatcher-dead-letter".to_string()
}

/// Default dispatch record TTL (one hour).
const fn default_dispatched_record_ttl_seconds() -> u64 {
    3_600
}

/// Default integration details TTL.
const fn default_integration_config_ttl_seconds() -> u64 {
    60
}

/// Default portal API root.
fn default_portal_base_url() -> String {
    "http://localhost:8000/api/v2".to_string()
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    10_000
}

/// Default read timeout.
const fn default_read_timeout_ms() -> u64 {
    20_000
}

/// Default cloud project id.
fn default_project_id() -> String {
    "local".to_string()
}

/// Default Pub/Sub REST endpoint.
fn default_pubsub_endpoint() -> String {
    "https://pubsub.googleapis.com".to_string()
}

/// Default publish attempts.
const fn default_max_attempts() -> u32 {
    5
}

/// Default initial publish backoff.
const fn default_initial_backoff_ms() -> u64 {
    200
}

/// Default publish request timeout.
const fn default_publish_timeout_ms() -> u64 {
    10_000
}

/// Default log filter.
fn default_log_level() -> String {
    "info".to_string()
}
