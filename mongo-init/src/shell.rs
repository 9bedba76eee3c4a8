//! mongosh invocation
//!
//! The engine's administrative interface is consumed by driving `mongosh`
//! as a subprocess, one connection per request: [`MongoShell::eval`] for
//! one-line scripts and [`MongoShell::run_script`] for multi-line scripts
//! piped through stdin. Script bodies carry credentials and are never
//! logged.

use crate::config::Config;
use crate::error::ProvisionError;
use crate::ADMIN_DATABASE;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// mongosh binary, resolved through PATH.
pub const MONGOSH_BIN: &str = "mongosh";

/// Captured result of one mongosh invocation.
#[derive(Debug)]
pub struct MongoshOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl MongoshOutput {
    fn from_output(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }

    /// Error text of a failed invocation. mongosh writes server errors to
    /// stderr in recent releases but used stdout historically, so fall back
    /// to stdout when stderr is empty.
    pub fn error_text(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Handle on one mongod instance, optionally carrying the root credential.
pub struct MongoShell {
    host: String,
    port: u16,
    root: Option<(String, String)>,
}

impl MongoShell {
    pub fn new(config: &Config) -> Self {
        let root = if config.use_root_auth {
            config
                .root
                .as_ref()
                .map(|r| (r.username.clone(), r.password.clone()))
        } else {
            None
        };

        Self {
            host: config.host.clone(),
            port: config.port,
            root,
        }
    }

    /// Connection arguments shared by every invocation. Root credentials
    /// always authenticate against the admin database.
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
            "--quiet".to_string(),
            "--norc".to_string(),
        ];

        if let Some((username, password)) = &self.root {
            args.push("--username".to_string());
            args.push(username.clone());
            args.push("--password".to_string());
            args.push(password.clone());
            args.push("--authenticationDatabase".to_string());
            args.push(ADMIN_DATABASE.to_string());
        }

        args
    }

    /// Run a one-line script via `--eval`.
    pub fn eval(&self, script: &str) -> Result<MongoshOutput, ProvisionError> {
        let output = Command::new(MONGOSH_BIN)
            .args(self.base_args())
            .args(["--eval", script])
            .stdin(Stdio::null())
            .output()?;

        Ok(MongoshOutput::from_output(output))
    }

    /// Run a multi-line script piped through stdin.
    pub fn run_script(&self, script: &str) -> Result<MongoshOutput, ProvisionError> {
        let mut child = Command::new(MONGOSH_BIN)
            .args(self.base_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        Ok(MongoshOutput::from_output(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppCredential, CredentialSource, OnExists, RootCredential};

    fn config(use_root_auth: bool, root: Option<RootCredential>) -> Config {
        Config {
            host: "db.internal".to_string(),
            port: 27018,
            use_root_auth,
            root,
            credential_source: CredentialSource::Literal,
            app: AppCredential {
                username: "mongoadmin".to_string(),
                password: "password".to_string(),
                database: "network_logs_db".to_string(),
            },
            on_exists: OnExists::Error,
        }
    }

    fn root() -> RootCredential {
        RootCredential {
            username: "root".to_string(),
            password: "rootpass".to_string(),
        }
    }

    #[test]
    fn root_auth_targets_the_admin_database() {
        let shell = MongoShell::new(&config(true, Some(root())));
        let args = shell.base_args();

        let username = args.iter().position(|a| a == "--username").unwrap();
        assert_eq!(args[username + 1], "root");
        let auth_db = args
            .iter()
            .position(|a| a == "--authenticationDatabase")
            .unwrap();
        assert_eq!(args[auth_db + 1], "admin");
    }

    #[test]
    fn disabled_root_auth_connects_anonymously() {
        // The credential may be present in the environment while the run is
        // configured not to use it.
        let shell = MongoShell::new(&config(false, Some(root())));
        let args = shell.base_args();

        assert!(!args.iter().any(|a| a == "--username"));
        assert!(!args.iter().any(|a| a == "--password"));
        assert!(args.contains(&"--quiet".to_string()));
    }

    #[test]
    fn connection_arguments_come_from_config() {
        let shell = MongoShell::new(&config(false, None));
        let args = shell.base_args();

        let host = args.iter().position(|a| a == "--host").unwrap();
        assert_eq!(args[host + 1], "db.internal");
        let port = args.iter().position(|a| a == "--port").unwrap();
        assert_eq!(args[port + 1], "27018");
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = MongoshOutput {
            stdout: "partial output".to_string(),
            stderr: "MongoServerError: boom".to_string(),
            success: false,
            code: Some(1),
        };
        assert_eq!(output.error_text(), "MongoServerError: boom");

        let stdout_only = MongoshOutput {
            stdout: "MongoServerError: boom".to_string(),
            stderr: String::new(),
            success: false,
            code: Some(1),
        };
        assert_eq!(stdout_only.error_text(), "MongoServerError: boom");
    }
}
