//! Declarative access-control spec
//!
//! A spec is a YAML document whose top-level sections are `databases`,
//! `warehouses`, `integrations`, `roles`, `users`, `version` and
//! `require-owner`. Entity sections are lists of single-key mappings:
//!
//! ```yaml
//! roles:
//!   - loader:
//!       member_of: [sysadmin]
//!       privileges:
//!         databases:
//!           write: [raw]
//! ```
//!
//! Section order and entity order are kept exactly as written.

pub mod entity;
pub mod error;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_yaml::Value;

pub use entity::{
    parse_flag, AccessLists, DatabaseConfig, Entity, HasOwner, IntegrationConfig, MemberOf,
    Owns, Privileges, RoleConfig, UserConfig, WarehouseConfig,
};
pub use error::{SpecError, SpecResult};

/// Top-level spec sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Databases,
    Warehouses,
    Integrations,
    Roles,
    Users,
    Version,
    RequireOwner,
}

impl SectionKind {
    /// Parse a section key
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "databases" => Some(SectionKind::Databases),
            "warehouses" => Some(SectionKind::Warehouses),
            "integrations" => Some(SectionKind::Integrations),
            "roles" => Some(SectionKind::Roles),
            "users" => Some(SectionKind::Users),
            "version" => Some(SectionKind::Version),
            "require-owner" => Some(SectionKind::RequireOwner),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Databases => "databases",
            SectionKind::Warehouses => "warehouses",
            SectionKind::Integrations => "integrations",
            SectionKind::Roles => "roles",
            SectionKind::Users => "users",
            SectionKind::Version => "version",
            SectionKind::RequireOwner => "require-owner",
        }
    }
}

/// Parsed spec document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spec {
    /// Sections in document order
    pub order: Vec<SectionKind>,
    pub version: Option<String>,
    pub require_owner: bool,
    pub databases: Vec<Entity<DatabaseConfig>>,
    pub warehouses: Vec<Entity<WarehouseConfig>>,
    pub integrations: Vec<Entity<IntegrationConfig>>,
    pub roles: Vec<Entity<RoleConfig>>,
    pub users: Vec<Entity<UserConfig>>,
}

impl Spec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a spec from YAML text
    pub fn from_yaml_str(contents: &str) -> SpecResult<Self> {
        let mapping = match serde_yaml::from_str::<Value>(contents)? {
            Value::Null => return Ok(Spec::default()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(SpecError::Shape("top level must be a mapping".to_string())),
        };

        let mut spec = Spec::default();
        for (key, value) in mapping {
            let key = key
                .as_str()
                .ok_or_else(|| SpecError::Shape("section names must be strings".to_string()))?;
            let kind =
                SectionKind::parse(key).ok_or_else(|| SpecError::UnknownSection(key.to_string()))?;

            match kind {
                SectionKind::Databases => spec.databases = parse_section(kind, value)?,
                SectionKind::Warehouses => spec.warehouses = parse_section(kind, value)?,
                SectionKind::Integrations => spec.integrations = parse_section(kind, value)?,
                SectionKind::Roles => spec.roles = parse_section(kind, value)?,
                SectionKind::Users => spec.users = parse_section(kind, value)?,
                SectionKind::Version => spec.version = scalar_text(&value),
                SectionKind::RequireOwner => {
                    spec.require_owner = match &value {
                        Value::Null => false,
                        Value::Bool(b) => *b,
                        Value::String(s) => parse_flag(s).ok_or_else(|| {
                            SpecError::Shape(format!("require-owner must be a boolean, found '{s}'"))
                        })?,
                        _ => {
                            return Err(SpecError::Shape(
                                "require-owner must be a boolean".to_string(),
                            ))
                        }
                    }
                }
            }
            if !spec.order.contains(&kind) {
                spec.order.push(kind);
            }
        }

        Ok(spec)
    }

    /// Read and parse a spec file
    pub fn from_path(path: impl AsRef<Path>) -> SpecResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Declared role names in document order
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|e| e.name.clone()).collect()
    }

    pub fn role(&self, name: &str) -> Option<&Entity<RoleConfig>> {
        self.roles.iter().find(|e| e.name == name)
    }

    fn touch(&mut self, kind: SectionKind) {
        if !self.order.contains(&kind) {
            self.order.push(kind);
        }
    }

    /// Append a database entry
    #[must_use]
    pub fn database(mut self, name: impl Into<String>, config: Option<DatabaseConfig>) -> Self {
        self.touch(SectionKind::Databases);
        self.databases.push(Entity::new(name, config));
        self
    }

    /// Append a warehouse entry
    #[must_use]
    pub fn warehouse(mut self, name: impl Into<String>, config: Option<WarehouseConfig>) -> Self {
        self.touch(SectionKind::Warehouses);
        self.warehouses.push(Entity::new(name, config));
        self
    }

    /// Append an integration entry
    #[must_use]
    pub fn integration(
        mut self,
        name: impl Into<String>,
        config: Option<IntegrationConfig>,
    ) -> Self {
        self.touch(SectionKind::Integrations);
        self.integrations.push(Entity::new(name, config));
        self
    }

    /// Append a role entry
    #[must_use]
    pub fn with_role(mut self, name: impl Into<String>, config: Option<RoleConfig>) -> Self {
        self.touch(SectionKind::Roles);
        self.roles.push(Entity::new(name, config));
        self
    }

    /// Append a user entry
    #[must_use]
    pub fn with_user(mut self, name: impl Into<String>, config: Option<UserConfig>) -> Self {
        self.touch(SectionKind::Users);
        self.users.push(Entity::new(name, config));
        self
    }

    /// Set the `require-owner` flag
    #[must_use]
    pub fn require_owner(mut self, required: bool) -> Self {
        self.touch(SectionKind::RequireOwner);
        self.require_owner = required;
        self
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_section<C: DeserializeOwned>(kind: SectionKind, value: Value) -> SpecResult<Vec<Entity<C>>> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        _ => {
            return Err(SpecError::Shape(format!(
                "section '{}' must be a list",
                kind.as_str()
            )))
        }
    };

    let mut entities = Vec::with_capacity(items.len());
    for item in items {
        let (name, config) = match item {
            Value::Mapping(map) if map.len() == 1 => map.into_iter().next().ok_or_else(|| {
                SpecError::Shape(format!("empty entry in section '{}'", kind.as_str()))
            })?,
            Value::String(name) => (Value::String(name), Value::Null),
            _ => {
                return Err(SpecError::Shape(format!(
                    "entries of section '{}' must be single-key mappings",
                    kind.as_str()
                )))
            }
        };

        let name = scalar_text(&name).ok_or_else(|| {
            SpecError::Shape(format!("entity names in '{}' must be scalars", kind.as_str()))
        })?;

        let config = match config {
            Value::Null => None,
            Value::Mapping(map) if map.is_empty() => None,
            other => Some(serde_yaml::from_value(other).map_err(|source| SpecError::Entity {
                section: kind.as_str(),
                name: name.clone(),
                source,
            })?),
        };

        entities.push(Entity { name, config });
    }

    Ok(entities)
}
