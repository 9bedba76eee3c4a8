//! Telemetry for reporting provisioning events
//!
//! Events are reported as JSON to an operator-supplied webhook endpoint
//! (`MONGO_INIT_TELEMETRY_ENDPOINT`). When no endpoint is configured the
//! events are still logged locally, so the bootstrap behaves the same with
//! and without a collector.

use crate::config::ConfigExt;
use chrono::Utc;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// All telemetry events the bootstrap can report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TelemetryEvent {
    /// Provisioning run started
    ProvisionStarted {
        database: String,
        username: String,
        credential_source: String,
    },

    /// Provisioning run finished and the principal is in place
    ProvisionCompleted {
        database: String,
        username: String,
        outcome: String,
        duration_ms: u64,
    },

    /// Provisioning run failed
    ProvisionFailed { phase: String, error: String },
}

impl TelemetryEvent {
    /// Get the event type name for logging/reporting.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ProvisionStarted { .. } => "MONGO_INIT_STARTED",
            Self::ProvisionCompleted { .. } => "MONGO_INIT_COMPLETED",
            Self::ProvisionFailed { .. } => "MONGO_INIT_FAILED",
        }
    }

    /// Convert event to a human-readable message.
    pub fn message(&self) -> String {
        match self {
            Self::ProvisionStarted {
                database,
                username,
                credential_source,
            } => {
                format!(
                    "Provisioning user '{}' in database '{}' (credentials from {})",
                    username, database, credential_source
                )
            }
            Self::ProvisionCompleted {
                database,
                username,
                outcome,
                duration_ms,
            } => {
                format!(
                    "User '{}' in database '{}' {} in {}ms",
                    username, database, outcome, duration_ms
                )
            }
            Self::ProvisionFailed { phase, error } => {
                format!("Provisioning failed during {}: {}", phase, error)
            }
        }
    }
}

/// Telemetry client for reporting bootstrap events.
#[derive(Clone)]
pub struct Telemetry {
    client: Arc<Client>,
    endpoint: Option<String>,
    component: String,
    run_id: String,
}

impl Telemetry {
    /// Create a new telemetry client from environment variables.
    ///
    /// Each client carries a fresh run id that ties together every event of
    /// one provisioning run.
    pub fn from_env(component: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client: Arc::new(client),
            endpoint: String::env_opt("MONGO_INIT_TELEMETRY_ENDPOINT"),
            component: component.to_string(),
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Identifier of this provisioning run, attached to every event.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn payload(&self, event: &TelemetryEvent) -> serde_json::Value {
        json!({
            "event": event.event_type(),
            "message": event.message(),
            "component": self.component,
            "run_id": self.run_id,
            "occurred_at": Utc::now().to_rfc3339(),
            "data": event,
        })
    }

    /// Send a telemetry event (fire and forget, non-blocking).
    ///
    /// This spawns a thread to send the event asynchronously.
    /// Errors are logged but do not affect the caller.
    pub fn send(&self, event: TelemetryEvent) {
        // Log locally first
        info!(event = %event.event_type(), "{}", event.message());

        let endpoint = match self.endpoint.clone() {
            Some(e) => e,
            None => return,
        };

        let client = Arc::clone(&self.client);
        let payload = self.payload(&event);

        thread::spawn(move || {
            if let Err(e) = post_event(&client, &endpoint, &payload) {
                warn!("Telemetry send failed: {}", e);
            }
        });
    }

    /// Send a telemetry event synchronously (blocking).
    ///
    /// Use this for the last event before the process exits, where a
    /// detached sender thread would be killed mid-flight.
    pub fn send_sync(&self, event: TelemetryEvent) {
        info!(event = %event.event_type(), "{}", event.message());

        let endpoint = match self.endpoint.as_deref() {
            Some(e) => e,
            None => return,
        };

        if let Err(e) = post_event(&self.client, endpoint, &self.payload(&event)) {
            warn!("Telemetry send failed: {}", e);
        }
    }
}

fn post_event(client: &Client, endpoint: &str, payload: &serde_json::Value) -> Result<(), String> {
    let resp = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .map_err(|e| e.to_string())?;

    if resp.status().is_success() {
        Ok(())
    } else {
        Err(format!("got status {}", resp.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_stable() {
        let started = TelemetryEvent::ProvisionStarted {
            database: "network_logs_db".to_string(),
            username: "mongoadmin".to_string(),
            credential_source: "literal".to_string(),
        };
        assert_eq!(started.event_type(), "MONGO_INIT_STARTED");

        let failed = TelemetryEvent::ProvisionFailed {
            phase: "authenticate".to_string(),
            error: "Authentication failed.".to_string(),
        };
        assert_eq!(failed.event_type(), "MONGO_INIT_FAILED");
    }

    #[test]
    fn messages_name_user_and_database() {
        let completed = TelemetryEvent::ProvisionCompleted {
            database: "network_logs_db".to_string(),
            username: "mongoadmin".to_string(),
            outcome: "created".to_string(),
            duration_ms: 42,
        };
        let msg = completed.message();
        assert!(msg.contains("mongoadmin"));
        assert!(msg.contains("network_logs_db"));
        assert!(msg.contains("42ms"));
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let failed = TelemetryEvent::ProvisionFailed {
            phase: "create_user".to_string(),
            error: "already exists".to_string(),
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["type"], "ProvisionFailed");
        assert_eq!(value["phase"], "create_user");
    }
}
