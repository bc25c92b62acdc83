//! In-memory connector backed by a JSON account snapshot
//!
//! The snapshot captures what the `SHOW` family of queries would return for
//! an account. Every answered query is appended to a log so callers can see
//! exactly which remote calls a run would have issued.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::error::{ConnectorError, ConnectorResult};
use super::{Connector, PrivilegeGrants, RoleGrants, Scope};

/// Captured state of a warehouse account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSnapshot {
    pub current_user: String,
    pub current_role: String,
    pub warehouses: Vec<String>,
    pub integrations: Vec<String>,
    pub databases: Vec<String>,
    /// `db.schema`
    pub schemas: Vec<String>,
    /// `db.schema.table`
    pub tables: Vec<String>,
    /// `db.schema.view`
    pub views: Vec<String>,
    /// Role name -> owner
    pub roles: BTreeMap<String, String>,
    pub users: Vec<String>,
    pub grants_to_role: RoleGrants,
    /// `db` or `db.schema` -> role -> grants
    pub future_grants: BTreeMap<String, RoleGrants>,
    pub roles_granted_to_user: BTreeMap<String, Vec<String>>,
}

fn push_unique(list: &mut Vec<String>, name: impl Into<String>) {
    let name = name.into();
    if !list.contains(&name) {
        list.push(name);
    }
}

fn insert_grant(grants: &mut PrivilegeGrants, privilege: &str, kind: &str, name: &str) {
    let names = grants
        .entry(privilege.to_string())
        .or_default()
        .entry(kind.to_string())
        .or_default();
    push_unique(names, name);
}

fn in_scope(name: &str, container: &str) -> bool {
    name.len() > container.len()
        && name.starts_with(container)
        && name.as_bytes()[container.len()] == b'.'
}

impl AccountSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from JSON text
    pub fn from_json_str(contents: &str) -> ConnectorResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    #[must_use]
    pub fn current_role(mut self, role: impl Into<String>) -> Self {
        self.current_role = role.into();
        self
    }

    #[must_use]
    pub fn current_user(mut self, user: impl Into<String>) -> Self {
        self.current_user = user.into();
        self
    }

    #[must_use]
    pub fn warehouse(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.warehouses, name);
        self
    }

    #[must_use]
    pub fn integration(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.integrations, name);
        self
    }

    #[must_use]
    pub fn database(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.databases, name);
        self
    }

    /// Add a `db.schema`
    #[must_use]
    pub fn schema(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.schemas, name);
        self
    }

    /// Add a `db.schema.table`
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.tables, name);
        self
    }

    /// Add a `db.schema.view`
    #[must_use]
    pub fn view(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.views, name);
        self
    }

    #[must_use]
    pub fn role(mut self, name: impl Into<String>, owner: impl Into<String>) -> Self {
        self.roles.insert(name.into(), owner.into());
        self
    }

    #[must_use]
    pub fn user(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.users, name);
        self
    }

    /// Record a direct grant held by `role`
    #[must_use]
    pub fn grant(mut self, role: &str, privilege: &str, kind: &str, name: &str) -> Self {
        let grants = self.grants_to_role.entry(role.to_string()).or_default();
        insert_grant(grants, privilege, kind, name);
        self
    }

    /// Record a future grant defined on `container` (`db` or `db.schema`)
    #[must_use]
    pub fn future_grant(
        mut self,
        container: &str,
        role: &str,
        privilege: &str,
        kind: &str,
        name: &str,
    ) -> Self {
        let grants = self
            .future_grants
            .entry(container.to_string())
            .or_default()
            .entry(role.to_string())
            .or_default();
        insert_grant(grants, privilege, kind, name);
        self
    }

    /// Record `role` as granted to `user`
    #[must_use]
    pub fn user_role(mut self, user: &str, role: &str) -> Self {
        let roles = self
            .roles_granted_to_user
            .entry(user.to_string())
            .or_default();
        push_unique(roles, role);
        self
    }

    fn database_exists(&self, database: &str) -> bool {
        self.databases.iter().any(|d| d == database)
            || self.schemas.iter().any(|s| in_scope(s, database))
    }

    fn objects_in(&self, objects: &[String], scope: Scope<'_>) -> ConnectorResult<Vec<String>> {
        let container = match scope {
            Scope::Account => return Ok(objects.to_vec()),
            Scope::Database(db) => {
                if !self.database_exists(db) {
                    return Err(ConnectorError::ObjectDoesNotExist(format!(
                        "Database '{}' does not exist or not authorized.",
                        db
                    )));
                }
                db
            }
            Scope::Schema(schema) => {
                if !self.schemas.iter().any(|s| s == schema) {
                    return Err(ConnectorError::ObjectDoesNotExist(format!(
                        "Schema '{}' does not exist or not authorized.",
                        schema
                    )));
                }
                schema
            }
        };
        Ok(objects
            .iter()
            .filter(|name| in_scope(name, container))
            .cloned()
            .collect())
    }
}

/// Connector answering queries from an [`AccountSnapshot`]
#[derive(Debug)]
pub struct SnapshotConnector {
    snapshot: AccountSnapshot,
    log: Mutex<Vec<String>>,
}

impl SnapshotConnector {
    pub fn new(snapshot: AccountSnapshot) -> Self {
        SnapshotConnector {
            snapshot,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Load a JSON snapshot from disk
    pub fn from_path(path: impl AsRef<Path>) -> ConnectorResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::new(AccountSnapshot::from_json_str(&contents)?))
    }

    pub fn snapshot(&self) -> &AccountSnapshot {
        &self.snapshot
    }

    /// Queries answered so far, in order
    pub fn issued(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Number of answered queries starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|q| q.starts_with(prefix))
            .count()
    }

    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    fn record(&self, query: String) {
        tracing::trace!(query = query.as_str(), "snapshot query");
        self.log.lock().push(query);
    }
}

#[async_trait]
impl Connector for SnapshotConnector {
    async fn current_user(&self) -> ConnectorResult<String> {
        self.record("SELECT CURRENT_USER()".to_string());
        Ok(self.snapshot.current_user.clone())
    }

    async fn current_role(&self) -> ConnectorResult<String> {
        self.record("SELECT CURRENT_ROLE()".to_string());
        Ok(self.snapshot.current_role.clone())
    }

    async fn show_warehouses(&self) -> ConnectorResult<Vec<String>> {
        self.record("SHOW WAREHOUSES".to_string());
        Ok(self.snapshot.warehouses.clone())
    }

    async fn show_integrations(&self) -> ConnectorResult<Vec<String>> {
        self.record("SHOW INTEGRATIONS".to_string());
        Ok(self.snapshot.integrations.clone())
    }

    async fn show_databases(&self) -> ConnectorResult<Vec<String>> {
        self.record("SHOW DATABASES".to_string());
        Ok(self.snapshot.databases.clone())
    }

    async fn show_schemas(&self, database: Option<&str>) -> ConnectorResult<Vec<String>> {
        match database {
            Some(db) => {
                self.record(format!("SHOW SCHEMAS IN DATABASE {}", db));
                self.snapshot
                    .objects_in(&self.snapshot.schemas, Scope::Database(db))
            }
            None => {
                self.record("SHOW SCHEMAS".to_string());
                Ok(self.snapshot.schemas.clone())
            }
        }
    }

    async fn show_tables(&self, scope: Scope<'_>) -> ConnectorResult<Vec<String>> {
        self.record(format!("SHOW TABLES IN {}", scope));
        self.snapshot.objects_in(&self.snapshot.tables, scope)
    }

    async fn show_views(&self, scope: Scope<'_>) -> ConnectorResult<Vec<String>> {
        self.record(format!("SHOW VIEWS IN {}", scope));
        self.snapshot.objects_in(&self.snapshot.views, scope)
    }

    async fn show_roles(&self) -> ConnectorResult<BTreeMap<String, String>> {
        self.record("SHOW ROLES".to_string());
        Ok(self.snapshot.roles.clone())
    }

    async fn show_users(&self) -> ConnectorResult<Vec<String>> {
        self.record("SHOW USERS".to_string());
        Ok(self.snapshot.users.clone())
    }

    async fn show_grants_to_role(&self, role: &str) -> ConnectorResult<PrivilegeGrants> {
        self.record(format!("SHOW GRANTS TO ROLE {}", role));
        Ok(self
            .snapshot
            .grants_to_role
            .get(role)
            .cloned()
            .unwrap_or_default())
    }

    async fn show_future_grants(&self, scope: Scope<'_>) -> ConnectorResult<RoleGrants> {
        self.record(format!("SHOW FUTURE GRANTS IN {}", scope));
        let container = match scope {
            Scope::Account => return Ok(RoleGrants::new()),
            Scope::Database(name) | Scope::Schema(name) => name,
        };
        Ok(self
            .snapshot
            .future_grants
            .get(container)
            .cloned()
            .unwrap_or_default())
    }

    async fn show_roles_granted_to_user(&self, user: &str) -> ConnectorResult<Vec<String>> {
        self.record(format!("SHOW GRANTS TO USER {}", user));
        Ok(self
            .snapshot
            .roles_granted_to_user
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}
