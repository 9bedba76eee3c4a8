//! Application user documents and the scripts that manage them
//!
//! Every user-management request is rendered as a small mongosh script.
//! Values are embedded as JSON string literals, so a password (or database
//! name) containing quotes or backslashes stays inside its literal instead
//! of terminating the script.

use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The only role this bootstrap ever grants.
pub const APP_ROLE: &str = "readWrite";

/// Marker printed by [`reconcile_script`] when it created the user.
pub const RECONCILE_CREATED: &str = "MONGO_INIT_RESULT:created";
/// Marker printed by [`reconcile_script`] when it reset an existing user.
pub const RECONCILE_UPDATED: &str = "MONGO_INIT_RESULT:updated";

/// A role grant, always scoped to a single database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    /// `readWrite` scoped to the target database. There is deliberately no
    /// other constructor: nothing in this tool can grant a different role
    /// or a different scope.
    pub fn read_write(database: &str) -> Self {
        Self {
            role: APP_ROLE.to_string(),
            db: database.to_string(),
        }
    }
}

/// Subset of the user document returned by `getUser`.
#[derive(Debug, Deserialize)]
pub struct ExistingUser {
    pub user: String,
    pub db: String,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// Encode a value as a JSON string literal, usable verbatim in a script.
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn user_document(username: &str, password: &str, database: &str) -> Value {
    json!({
        "user": username,
        "pwd": password,
        "roles": [RoleGrant::read_write(database)],
    })
}

/// One-line script issuing `createUser` against the target database.
pub fn create_user_script(username: &str, password: &str, database: &str) -> String {
    format!(
        "db.getSiblingDB({}).createUser({})",
        js_string(database),
        user_document(username, password, database)
    )
}

/// One-line script printing the existing user document as EJSON, or the
/// bare word `null` when the user does not exist.
pub fn get_user_script(username: &str, database: &str) -> String {
    format!(
        "const u = db.getSiblingDB({}).getUser({}); print(u === null ? \"null\" : EJSON.stringify(u))",
        js_string(database),
        js_string(username)
    )
}

/// Script that creates the user if absent and otherwise resets password and
/// roles to the configured grant. Prints a marker line naming which branch
/// ran.
pub fn reconcile_script(username: &str, password: &str, database: &str) -> String {
    format!(
        r#"const target = db.getSiblingDB({db});
if (target.getUser({user}) === null) {{
  target.createUser({doc});
  print({created});
}} else {{
  target.updateUser({user}, {{ pwd: {pwd}, roles: {roles} }});
  print({updated});
}}"#,
        db = js_string(database),
        user = js_string(username),
        doc = user_document(username, password, database),
        pwd = js_string(password),
        roles = json!([RoleGrant::read_write(database)]),
        created = js_string(RECONCILE_CREATED),
        updated = js_string(RECONCILE_UPDATED),
    )
}

/// Parse the stdout of [`get_user_script`].
///
/// mongosh may print connection noise before the result even with
/// `--quiet`, so only the final nonempty line counts.
pub fn parse_get_user(stdout: &str) -> Result<Option<ExistingUser>, ProvisionError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("");

    if line.is_empty() || line == "null" {
        return Ok(None);
    }

    let user: ExistingUser = serde_json::from_str(line)?;
    Ok(Some(user))
}
