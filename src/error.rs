//! Reconciliation error taxonomy
//!
//! Validation stages collect every problem of a run before failing, so
//! [`PermissionsError::Validation`] and [`PermissionsError::Configuration`]
//! carry lists rather than a single cause.

use std::fmt;

use thiserror::Error;

use crate::connector::ConnectorError;
use crate::spec::SpecError;

/// Entity classes checked for existence on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    Warehouse,
    Integration,
    Database,
    Schema,
    Table,
    Role,
    User,
}

impl EntityClass {
    /// Lowercase noun used in log lines
    pub fn noun(&self) -> &'static str {
        match self {
            EntityClass::Warehouse => "warehouse",
            EntityClass::Integration => "integration",
            EntityClass::Database => "database",
            EntityClass::Schema => "schema",
            EntityClass::Table => "table",
            EntityClass::Role => "role",
            EntityClass::User => "user",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityClass::Warehouse => "Warehouse",
            EntityClass::Integration => "Integration",
            EntityClass::Database => "Database",
            EntityClass::Schema => "Schema",
            EntityClass::Table => "Table/View",
            EntityClass::Role => "Role",
            EntityClass::User => "User",
        };
        f.write_str(label)
    }
}

/// A single entity-level validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// Spec references an entity the server does not have
    #[error("Missing Entity Error: {class} {name} was not found on the server. Please create it before continuing.")]
    Missing { class: EntityClass, name: String },

    /// Role exists but is owned by a different role than declared
    #[error("Role {role} has owner {server_owner} on the server, but has owner {spec_owner} defined in the spec file.")]
    OwnerMismatch {
        role: String,
        server_owner: String,
        spec_owner: String,
    },
}

impl EntityError {
    pub fn is_missing(&self) -> bool {
        matches!(self, EntityError::Missing { .. })
    }
}

fn join_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors that abort a reconciliation run
#[derive(Error, Debug)]
pub enum PermissionsError {
    /// Connection is not operating as the administrator role
    #[error("Current role is not {expected}! grantsmith expects to run as {expected}, please update your connection settings.")]
    Permission { expected: String, actual: String },

    /// Aggregated missing-entity and owner-mismatch errors
    #[error("{}", join_lines(.0))]
    Validation(Vec<EntityError>),

    /// Aggregated spec configuration errors
    #[error("{}", join_lines(.0))]
    Configuration(Vec<String>),

    /// Spec could not be loaded
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    /// Connector query failed
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),
}

/// Result type for reconciliation operations
pub type PermissionsResult<T> = Result<T, PermissionsError>;
