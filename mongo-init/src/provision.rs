//! The provisioning flow
//!
//! Linear and run-to-completion: optionally prove the root credential
//! against the admin database, then ensure the application user exists per
//! the configured on-exists policy. No retries and no state outside the
//! instance itself; rerunning against a provisioned volume is the caller's
//! decision to make.

use crate::config::{Config, OnExists, RootCredential};
use crate::error::ProvisionError;
use crate::shell::MongoShell;
use crate::user;
use std::fmt;
use tracing::info;

/// Terminal state of one provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The application user was created.
    Created,
    /// The application user was already present and left untouched.
    AlreadyExists,
    /// The application user was already present; password and roles were
    /// reset to the configured values.
    Updated,
}

impl ProvisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already existed",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ensure the application user exists with `readWrite` on the target
/// database.
pub fn provision_app_user(config: &Config) -> Result<ProvisionOutcome, ProvisionError> {
    let shell = MongoShell::new(config);

    if config.use_root_auth {
        if let Some(root) = &config.root {
            authenticate_root(&shell, root, config)?;
        }
    }

    match config.on_exists {
        OnExists::Error => create_user(&shell, config),
        OnExists::Skip => match lookup_user(&shell, config)? {
            Some(existing) => {
                info!(
                    user = %existing.user,
                    database = %existing.db,
                    "User already exists, leaving credential untouched"
                );
                Ok(ProvisionOutcome::AlreadyExists)
            }
            None => create_user(&shell, config),
        },
        OnExists::Reconcile => reconcile_user(&shell, config),
    }
}

/// Prove the root credential with an authenticated ping before touching any
/// user. A bad credential fails here, before `createUser`, exactly like the
/// historical explicit `auth()` call did.
fn authenticate_root(
    shell: &MongoShell,
    root: &RootCredential,
    config: &Config,
) -> Result<(), ProvisionError> {
    let output = shell.eval("db.adminCommand({ ping: 1 })")?;
    if !output.success {
        return Err(ProvisionError::classify(
            &output,
            &config.app.username,
            &config.app.database,
        ));
    }

    info!(user = %root.username, "Authenticated against the admin database");
    Ok(())
}

fn create_user(shell: &MongoShell, config: &Config) -> Result<ProvisionOutcome, ProvisionError> {
    let app = &config.app;
    let script = user::create_user_script(&app.username, &app.password, &app.database);
    let output = shell.eval(&script)?;
    if !output.success {
        return Err(ProvisionError::classify(
            &output,
            &app.username,
            &app.database,
        ));
    }

    info!(
        user = %app.username,
        database = %app.database,
        role = user::APP_ROLE,
        "Created application user"
    );
    Ok(ProvisionOutcome::Created)
}

fn lookup_user(
    shell: &MongoShell,
    config: &Config,
) -> Result<Option<user::ExistingUser>, ProvisionError> {
    let app = &config.app;
    let output = shell.eval(&user::get_user_script(&app.username, &app.database))?;
    if !output.success {
        return Err(ProvisionError::classify(
            &output,
            &app.username,
            &app.database,
        ));
    }

    user::parse_get_user(&output.stdout)
}

fn reconcile_user(shell: &MongoShell, config: &Config) -> Result<ProvisionOutcome, ProvisionError> {
    let app = &config.app;
    let script = user::reconcile_script(&app.username, &app.password, &app.database);
    let output = shell.run_script(&script)?;
    if !output.success {
        return Err(ProvisionError::classify(
            &output,
            &app.username,
            &app.database,
        ));
    }

    if output.stdout.contains(user::RECONCILE_UPDATED) {
        info!(
            user = %app.username,
            database = %app.database,
            "Reset existing user to the configured credential"
        );
        Ok(ProvisionOutcome::Updated)
    } else if output.stdout.contains(user::RECONCILE_CREATED) {
        info!(
            user = %app.username,
            database = %app.database,
            role = user::APP_ROLE,
            "Created application user"
        );
        Ok(ProvisionOutcome::Created)
    } else {
        Err(ProvisionError::UnexpectedOutput(format!(
            "reconcile printed no result marker: {}",
            output.stdout
        )))
    }
}
