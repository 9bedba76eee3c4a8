//! MongoDB application-user bootstrap
//!
//! Runs once when a fresh instance comes up and ensures the application
//! principal exists with `readWrite` scoped to the target database. The
//! binary in `src/bin/mongo_init.rs` wires this library to the environment;
//! everything else is plain library code so the integration tests can drive
//! the same flow directly.

pub mod config;
pub mod error;
pub mod provision;
pub mod shell;
pub mod user;

pub use config::{Config, CredentialSource, OnExists};
pub use error::ProvisionError;
pub use provision::{provision_app_user, ProvisionOutcome};
pub use shell::{MongoShell, MongoshOutput};

/// Administrative database holding root principals.
pub const ADMIN_DATABASE: &str = "admin";
