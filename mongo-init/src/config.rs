//! Bootstrap configuration
//!
//! Historically this tool shipped as two near-identical scripts: one that
//! authenticated as root before creating the application user and one that
//! relied on an open localhost session. Both are collapsed into a single
//! routine here; whether to authenticate and where the application
//! credential comes from are explicit configuration instead of script
//! variants.

use anyhow::{bail, Context, Result};
use common::ConfigExt;
use std::fmt;

/// Application username applied when no credential is injected.
pub const DEFAULT_APP_USERNAME: &str = "mongoadmin";
/// Application password applied when no credential is injected.
pub const DEFAULT_APP_PASSWORD: &str = "password";
/// Target database applied when no credential is injected.
pub const DEFAULT_APP_DATABASE: &str = "network_logs_db";

/// Where the application credential comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `MONGO_INITDB_APP_USERNAME`, `MONGO_INITDB_APP_PASSWORD` and
    /// `MONGO_INITDB_DATABASE`.
    Env,
    /// The compiled-in defaults above.
    Literal,
}

impl CredentialSource {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "literal" => Ok(Self::Literal),
            other => bail!(
                "Invalid credential source '{}', expected 'env' or 'literal'",
                other
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Literal => "literal",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when the application user already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnExists {
    /// Leave the existing credential and grants untouched.
    Skip,
    /// Let the duplicate-user error surface. This matches the historical
    /// behavior: a rerun against a provisioned volume logs the error and
    /// changes nothing.
    Error,
    /// Reset password and roles to the configured values.
    Reconcile,
}

impl OnExists {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "error" => Ok(Self::Error),
            "reconcile" => Ok(Self::Reconcile),
            other => bail!(
                "Invalid on-exists policy '{}', expected 'skip', 'error' or 'reconcile'",
                other
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Error => "error",
            Self::Reconcile => "reconcile",
        }
    }
}

impl fmt::Display for OnExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root credential for the administrative database.
#[derive(Debug, Clone)]
pub struct RootCredential {
    pub username: String,
    pub password: String,
}

/// Application credential to provision.
#[derive(Debug, Clone)]
pub struct AppCredential {
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Configuration for one bootstrap run.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Authenticate as root before provisioning.
    pub use_root_auth: bool,
    /// Present whenever the image injected both root variables.
    pub root: Option<RootCredential>,
    pub credential_source: CredentialSource,
    pub app: AppCredential,
    pub on_exists: OnExists,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Root authentication defaults on exactly when the image injected a
    /// root credential (`MONGO_INITDB_ROOT_USERNAME` and
    /// `MONGO_INITDB_ROOT_PASSWORD` both set and nonempty), so the two
    /// historical deployments keep working without extra configuration.
    pub fn from_env() -> Result<Self> {
        let root_username = String::env_opt("MONGO_INITDB_ROOT_USERNAME");
        let root_password = String::env_opt("MONGO_INITDB_ROOT_PASSWORD");
        let root = match (root_username, root_password) {
            (Some(username), Some(password)) => Some(RootCredential { username, password }),
            _ => None,
        };

        let use_root_auth = bool::env_bool("MONGO_INIT_USE_ROOT_AUTH", root.is_some());
        if use_root_auth && root.is_none() {
            bail!(
                "MONGO_INIT_USE_ROOT_AUTH is enabled but MONGO_INITDB_ROOT_USERNAME \
                 and MONGO_INITDB_ROOT_PASSWORD are not both set"
            );
        }

        let credential_source = CredentialSource::parse(&String::env_or(
            "MONGO_INIT_CREDENTIAL_SOURCE",
            "literal",
        ))
        .context("Failed to read MONGO_INIT_CREDENTIAL_SOURCE")?;

        let app = match credential_source {
            CredentialSource::Env => AppCredential {
                username: String::env_required("MONGO_INITDB_APP_USERNAME")?,
                password: String::env_required("MONGO_INITDB_APP_PASSWORD")?,
                database: String::env_required("MONGO_INITDB_DATABASE")?,
            },
            CredentialSource::Literal => AppCredential {
                username: DEFAULT_APP_USERNAME.to_string(),
                password: DEFAULT_APP_PASSWORD.to_string(),
                database: DEFAULT_APP_DATABASE.to_string(),
            },
        };

        if app.username.trim().is_empty()
            || app.password.trim().is_empty()
            || app.database.trim().is_empty()
        {
            bail!("Application username, password and database must be nonempty");
        }

        let on_exists = OnExists::parse(&String::env_or("MONGO_INIT_ON_EXISTS", "error"))
            .context("Failed to read MONGO_INIT_ON_EXISTS")?;

        Ok(Self {
            host: String::env_or("MONGO_INIT_HOST", "localhost"),
            port: u16::env_parse("MONGO_INIT_PORT", 27017),
            use_root_auth,
            root,
            credential_source,
            app,
            on_exists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Environment variables are process-global, so every test that touches
    // them holds this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "MONGO_INITDB_ROOT_USERNAME",
        "MONGO_INITDB_ROOT_PASSWORD",
        "MONGO_INIT_USE_ROOT_AUTH",
        "MONGO_INIT_CREDENTIAL_SOURCE",
        "MONGO_INITDB_APP_USERNAME",
        "MONGO_INITDB_APP_PASSWORD",
        "MONGO_INITDB_DATABASE",
        "MONGO_INIT_ON_EXISTS",
        "MONGO_INIT_HOST",
        "MONGO_INIT_PORT",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_match_the_historical_scripts() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 27017);
        assert!(!config.use_root_auth);
        assert!(config.root.is_none());
        assert_eq!(config.credential_source, CredentialSource::Literal);
        assert_eq!(config.app.username, DEFAULT_APP_USERNAME);
        assert_eq!(config.app.password, DEFAULT_APP_PASSWORD);
        assert_eq!(config.app.database, DEFAULT_APP_DATABASE);
        assert_eq!(config.on_exists, OnExists::Error);
    }

    #[test]
    fn root_credential_enables_root_auth_by_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INITDB_ROOT_USERNAME", "root");
        env::set_var("MONGO_INITDB_ROOT_PASSWORD", "rootpass");

        let config = Config::from_env().unwrap();
        assert!(config.use_root_auth);
        let root = config.root.unwrap();
        assert_eq!(root.username, "root");
        assert_eq!(root.password, "rootpass");
    }

    #[test]
    fn root_auth_can_be_disabled_explicitly() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INITDB_ROOT_USERNAME", "root");
        env::set_var("MONGO_INITDB_ROOT_PASSWORD", "rootpass");
        env::set_var("MONGO_INIT_USE_ROOT_AUTH", "false");

        let config = Config::from_env().unwrap();
        assert!(!config.use_root_auth);
        assert!(config.root.is_some());
    }

    #[test]
    fn root_auth_without_credential_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INIT_USE_ROOT_AUTH", "true");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("MONGO_INITDB_ROOT_USERNAME"));
    }

    #[test]
    fn blank_root_password_counts_as_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INITDB_ROOT_USERNAME", "root");
        env::set_var("MONGO_INITDB_ROOT_PASSWORD", "   ");

        let config = Config::from_env().unwrap();
        assert!(config.root.is_none());
        assert!(!config.use_root_auth);
    }

    #[test]
    fn env_source_reads_the_injected_credential() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INIT_CREDENTIAL_SOURCE", "env");
        env::set_var("MONGO_INITDB_APP_USERNAME", "svc_logs");
        env::set_var("MONGO_INITDB_APP_PASSWORD", "s3cret");
        env::set_var("MONGO_INITDB_DATABASE", "telemetry_db");

        let config = Config::from_env().unwrap();
        assert_eq!(config.credential_source, CredentialSource::Env);
        assert_eq!(config.app.username, "svc_logs");
        assert_eq!(config.app.password, "s3cret");
        assert_eq!(config.app.database, "telemetry_db");
    }

    #[test]
    fn env_source_without_credential_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INIT_CREDENTIAL_SOURCE", "env");
        env::set_var("MONGO_INITDB_APP_USERNAME", "svc_logs");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("MONGO_INITDB_APP_PASSWORD"));
    }

    #[test]
    fn unknown_policy_values_are_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("MONGO_INIT_ON_EXISTS", "sometimes");

        assert!(Config::from_env().is_err());
    }

    #[test]
    fn policy_parsing_is_case_insensitive() {
        assert_eq!(OnExists::parse("Reconcile").unwrap(), OnExists::Reconcile);
        assert_eq!(OnExists::parse("SKIP").unwrap(), OnExists::Skip);
        assert_eq!(CredentialSource::parse("ENV").unwrap(), CredentialSource::Env);
        assert!(OnExists::parse("upsert").is_err());
        assert!(CredentialSource::parse("vault").is_err());
    }
}
