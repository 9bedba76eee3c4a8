//! Provisioning failures
//!
//! mongosh reports server-side failures as text on stderr, so the
//! interesting conditions (duplicate user, rejected credential, unreachable
//! instance) are recovered from the error text of a failed invocation.

use crate::shell::MongoshOutput;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Authentication against the admin database failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("User '{username}' already exists in database '{database}'")]
    DuplicateUser { username: String, database: String },

    #[error("Could not reach mongod: {message}")]
    Connection { message: String },

    #[error("mongosh failed (exit {code:?}): {stderr}")]
    Shell { code: Option<i32>, stderr: String },

    #[error("Failed to run mongosh: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Failed to parse mongosh output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected mongosh output: {0}")]
    UnexpectedOutput(String),
}

impl ProvisionError {
    /// Classify a failed invocation by the engine's error text.
    ///
    /// The server phrases these consistently: `createUser` against an
    /// existing principal reports `already exists` (code 51003), a rejected
    /// credential reports `Authentication failed.` (code 18) and a dead or
    /// unreachable instance surfaces as a network error from the shell
    /// itself.
    pub fn classify(output: &MongoshOutput, username: &str, database: &str) -> Self {
        let text = output.error_text();

        if text.contains("already exists") || text.contains("51003") {
            return Self::DuplicateUser {
                username: username.to_string(),
                database: database.to_string(),
            };
        }

        if text.contains("Authentication failed")
            || text.contains("AuthenticationFailed")
            || text.contains("requires authentication")
        {
            return Self::AuthenticationFailed {
                message: text.to_string(),
            };
        }

        if text.contains("ECONNREFUSED")
            || text.contains("MongoNetworkError")
            || text.contains("getaddrinfo")
            || text.contains("Server selection timed out")
        {
            return Self::Connection {
                message: text.to_string(),
            };
        }

        Self::Shell {
            code: output.code,
            stderr: text.to_string(),
        }
    }

    /// Phase reported alongside the failure.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "authenticate",
            Self::Connection { .. } => "connect",
            Self::Spawn(_) => "spawn",
            Self::DuplicateUser { .. }
            | Self::Shell { .. }
            | Self::Parse(_)
            | Self::UnexpectedOutput(_) => "create_user",
        }
    }
}
