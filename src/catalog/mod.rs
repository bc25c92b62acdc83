//! Entity catalog - the normalized name sets a spec tracks
//!
//! The catalog is derived from a [`Spec`] once per run and answers two
//! questions for later stages: which names must exist on the server, and
//! which names are in scope for privilege management (the `*_refs` sets).
//! Wildcard forms such as `raw.*` or `raw.public.*` are kept verbatim in the
//! ref sets; existence checks skip them.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PermissionsError, PermissionsResult};
use crate::spec::{Entity, HasOwner, Spec};

/// Entity names tracked by a spec, grouped by category
///
/// Every category is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityCatalog {
    /// Declared warehouses
    pub warehouses: BTreeSet<String>,
    /// Declared plus role-referenced warehouses
    pub warehouse_refs: BTreeSet<String>,
    /// Declared integrations
    pub integrations: BTreeSet<String>,
    /// Declared plus role-referenced integrations
    pub integration_refs: BTreeSet<String>,
    /// Declared databases
    pub databases: BTreeSet<String>,
    /// Declared plus every database reachable by role privileges or ownership
    pub database_refs: BTreeSet<String>,
    /// Declared databases marked `shared`
    pub shared_databases: BTreeSet<String>,
    /// `db.schema` or `db.*`
    pub schema_refs: BTreeSet<String>,
    /// `db.schema.table`, `db.schema.*` or `db.*.*`
    pub table_refs: BTreeSet<String>,
    /// Table refs grouped by database
    pub tables_by_database: BTreeMap<String, Vec<String>>,
    /// Declared roles plus roles named in `member_of`
    pub roles: BTreeSet<String>,
    /// Declared users
    pub users: BTreeSet<String>,
}

fn database_of(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn has_parts(name: &str, parts: usize) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    segments.len() == parts && segments.iter().all(|s| !s.is_empty())
}

fn check_owners<C: HasOwner>(kind: &str, entities: &[Entity<C>], errors: &mut Vec<String>) {
    for entity in entities {
        if entity.owner().is_none() {
            errors.push(format!(
                "Spec Error: Owner not defined for {} {}.",
                kind, entity.name
            ));
        }
    }
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a schema ref and the database it lives in
    fn add_schema_ref(&mut self, role: &str, schema: &str, errors: &mut Vec<String>) {
        if !has_parts(schema, 2) {
            errors.push(format!(
                "Spec Error: schema {} referenced by role {} must be of the form database.schema.",
                schema, role
            ));
            return;
        }
        self.database_refs.insert(database_of(schema).to_string());
        self.schema_refs.insert(schema.to_string());
    }

    /// Record a table ref, its database, and its per-database grouping
    fn add_table_ref(&mut self, role: &str, table: &str, errors: &mut Vec<String>) {
        if !has_parts(table, 3) {
            errors.push(format!(
                "Spec Error: table {} referenced by role {} must be of the form database.schema.table.",
                table, role
            ));
            return;
        }
        let database = database_of(table).to_string();
        self.database_refs.insert(database.clone());
        if self.table_refs.insert(table.to_string()) {
            self.tables_by_database
                .entry(database)
                .or_default()
                .push(table.to_string());
        }
    }
}

/// Build the entity catalog for a spec
///
/// Fails with [`PermissionsError::Configuration`] listing every malformed
/// reference and, when `require-owner` is set, every entity without an owner.
pub fn inspect_entities(spec: &Spec) -> PermissionsResult<EntityCatalog> {
    let mut catalog = EntityCatalog::new();
    let mut errors = Vec::new();

    for db in &spec.databases {
        catalog.databases.insert(db.name.clone());
        catalog.database_refs.insert(db.name.clone());
        if db.config.as_ref().is_some_and(|c| c.shared) {
            catalog.shared_databases.insert(db.name.clone());
        }
    }

    for wh in &spec.warehouses {
        catalog.warehouses.insert(wh.name.clone());
        catalog.warehouse_refs.insert(wh.name.clone());
    }

    for integration in &spec.integrations {
        catalog.integrations.insert(integration.name.clone());
        catalog.integration_refs.insert(integration.name.clone());
    }

    for role in &spec.roles {
        catalog.roles.insert(role.name.clone());
        let Some(config) = &role.config else {
            continue;
        };

        for member in config.member_of.mentioned() {
            if member != "*" {
                catalog.roles.insert(member.clone());
            }
        }
        catalog.warehouse_refs.extend(config.warehouses.iter().cloned());
        catalog
            .integration_refs
            .extend(config.integrations.iter().cloned());

        for db in config
            .privileges
            .databases
            .all()
            .chain(config.owns.databases.iter())
        {
            catalog.database_refs.insert(db.clone());
        }
        for schema in config
            .privileges
            .schemas
            .all()
            .chain(config.owns.schemas.iter())
        {
            catalog.add_schema_ref(&role.name, schema, &mut errors);
        }
        for table in config
            .privileges
            .tables
            .all()
            .chain(config.owns.tables.iter())
        {
            catalog.add_table_ref(&role.name, table, &mut errors);
        }
    }

    for user in &spec.users {
        catalog.users.insert(user.name.clone());
        if let Some(config) = &user.config {
            for member in &config.member_of {
                if member == "*" {
                    errors.push(format!(
                        "Spec Error: user {} cannot use '*' in member_of, list its roles explicitly.",
                        user.name
                    ));
                } else {
                    catalog.roles.insert(member.clone());
                }
            }
        }
    }

    if spec.require_owner {
        check_owners("database", &spec.databases, &mut errors);
        check_owners("warehouse", &spec.warehouses, &mut errors);
        check_owners("integration", &spec.integrations, &mut errors);
        check_owners("role", &spec.roles, &mut errors);
        check_owners("user", &spec.users, &mut errors);
    }

    if !errors.is_empty() {
        return Err(PermissionsError::Configuration(errors));
    }

    tracing::debug!(
        databases = catalog.databases.len(),
        roles = catalog.roles.len(),
        users = catalog.users.len(),
        "Inspected spec entities"
    );
    Ok(catalog)
}
