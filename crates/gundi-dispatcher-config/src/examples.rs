// crates/gundi-dispatcher-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and deployment templates.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for the dispatcher configuration. The output is static
//! and must always load and validate.

/// Returns a canonical example `gundi-dispatcher.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "0.0.0.0:8080"
max_body_bytes = 10485760

[dispatch]
max_event_age_seconds = 86400
dispatcher_events_topic = "dispatcher-events"
dead_letter_topic = "dispatcher-dead-letter"

[cache]
backend = "redis"
url = "redis://localhost:6379/3"
dispatched_record_ttl_seconds = 3600
integration_config_ttl_seconds = 60

[portal]
base_url = "https://api.gundiservice.org/api/v2"
# token = "portal-service-token"
connect_timeout_ms = 10000
read_timeout_ms = 20000

[destination]
connect_timeout_ms = 10000
read_timeout_ms = 20000

[publisher]
project_id = "gundi-prod"
endpoint = "https://pubsub.googleapis.com"
# access_token = "oauth-access-token"
max_attempts = 5
initial_backoff_ms = 200

[blob_store]
type = "directory"
root = "/var/lib/gundi/attachments"

[logging]
level = "info"
format = "json"
"#,
    )
}
