//! MongoDB application-user bootstrap entrypoint
//!
//! Runs once while the instance initializes a fresh volume. Every failure
//! is logged and swallowed: this process must never abort the enclosing
//! startup, so it reports completion and exits 0 on every path.

use common::{init_logging, Telemetry, TelemetryEvent};
use mongo_init::{provision_app_user, Config};
use std::time::Instant;
use tracing::{error, info};

fn main() {
    let _guard = init_logging("mongo-init");

    let start = Instant::now();
    let telemetry = Telemetry::from_env("mongo-init");

    info!(run_id = %telemetry.run_id(), "Starting mongo-init");

    run(&telemetry, start);

    info!("Completed mongo-init");
}

fn run(telemetry: &Telemetry, start: Instant) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, phase = "config", "Error creating user");
            telemetry.send_sync(TelemetryEvent::ProvisionFailed {
                phase: "config".to_string(),
                error: e.to_string(),
            });
            return;
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        database = %config.app.database,
        user = %config.app.username,
        source = %config.credential_source,
        on_exists = %config.on_exists,
        root_auth = config.use_root_auth,
        "Provisioning application user"
    );

    telemetry.send(TelemetryEvent::ProvisionStarted {
        database: config.app.database.clone(),
        username: config.app.username.clone(),
        credential_source: config.credential_source.to_string(),
    });

    match provision_app_user(&config) {
        Ok(outcome) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            info!(outcome = %outcome, duration_ms, "Provisioning finished");
            telemetry.send_sync(TelemetryEvent::ProvisionCompleted {
                database: config.app.database.clone(),
                username: config.app.username.clone(),
                outcome: outcome.to_string(),
                duration_ms,
            });
        }
        Err(e) => {
            // A rerun against an already-provisioned volume lands here with
            // a duplicate-user error; the existing credential is untouched.
            error!(error = %e, phase = e.phase(), "Error creating user");
            telemetry.send_sync(TelemetryEvent::ProvisionFailed {
                phase: e.phase().to_string(),
                error: e.to_string(),
            });
        }
    }
}
