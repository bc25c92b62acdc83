//! Warehouse connector interface
//!
//! The reconciliation engine only ever talks to the account through the
//! query-shaped [`Connector`] trait. Every name returned by a connector is
//! expected to be normalized already (casing, quoting); nothing downstream
//! re-normalizes.

pub mod error;
pub mod snapshot;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

pub use error::{ConnectorError, ConnectorResult};
pub use snapshot::{AccountSnapshot, SnapshotConnector};

/// Grants held by one grantee: privilege -> object kind -> object names
pub type PrivilegeGrants = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Grants keyed by role: role -> privilege -> object kind -> object names
pub type RoleGrants = BTreeMap<String, PrivilegeGrants>;

/// Container an object listing or future grant is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Account,
    Database(&'a str),
    /// Fully qualified `db.schema`
    Schema(&'a str),
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Account => write!(f, "ACCOUNT"),
            Scope::Database(db) => write!(f, "DATABASE {}", db),
            Scope::Schema(schema) => write!(f, "SCHEMA {}", schema),
        }
    }
}

/// Read-only view of a warehouse account's entities and grants
#[async_trait]
pub trait Connector: Send + Sync {
    /// User the connection is authenticated as
    async fn current_user(&self) -> ConnectorResult<String>;

    /// Role the connection is operating under
    async fn current_role(&self) -> ConnectorResult<String>;

    async fn show_warehouses(&self) -> ConnectorResult<Vec<String>>;

    async fn show_integrations(&self) -> ConnectorResult<Vec<String>>;

    async fn show_databases(&self) -> ConnectorResult<Vec<String>>;

    /// Fully qualified schema names, optionally limited to one database
    async fn show_schemas(&self, database: Option<&str>) -> ConnectorResult<Vec<String>>;

    /// Fully qualified table names within `scope`
    ///
    /// Fails with [`ConnectorError::ObjectDoesNotExist`] when the scope itself
    /// does not exist.
    async fn show_tables(&self, scope: Scope<'_>) -> ConnectorResult<Vec<String>>;

    /// Fully qualified view names within `scope`
    async fn show_views(&self, scope: Scope<'_>) -> ConnectorResult<Vec<String>>;

    /// Role name -> owning role
    async fn show_roles(&self) -> ConnectorResult<BTreeMap<String, String>>;

    async fn show_users(&self) -> ConnectorResult<Vec<String>>;

    /// Direct grants held by a role
    async fn show_grants_to_role(&self, role: &str) -> ConnectorResult<PrivilegeGrants>;

    /// Future grants defined on a database or schema, keyed by grantee role
    ///
    /// Object names use the `<table>`/`<view>`/`<schema>` marker form, e.g.
    /// `raw.public.<table>`.
    async fn show_future_grants(&self, scope: Scope<'_>) -> ConnectorResult<RoleGrants>;

    /// Roles currently granted to a user
    async fn show_roles_granted_to_user(&self, user: &str) -> ConnectorResult<Vec<String>>;
}
