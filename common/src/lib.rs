//! Shared utilities for the mongo-init bootstrap tooling
//!
//! This crate provides the ambient concerns used by the bootstrap binary:
//! - Structured logging initialization
//! - Environment variable parsing helpers
//! - Telemetry for reporting provisioning events

pub mod config;
pub mod logging;
pub mod telemetry;

pub use config::ConfigExt;
pub use logging::init_logging;
pub use telemetry::{Telemetry, TelemetryEvent};
