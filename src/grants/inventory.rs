//! Object listings for wildcard expansion
//!
//! Role privileges and ownership may name `db.*` schemas or `db.schema.*` /
//! `db.*.*` tables. The listings those rules need are fetched once, up
//! front, so command generation itself never queries the server.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::EntityCatalog;
use crate::config::{RunOptions, RunPhase};
use crate::connector::{Connector, ConnectorError, ConnectorResult, Scope};
use crate::error::PermissionsResult;
use crate::spec::Spec;

/// Schemas, tables and views of the containers wildcard rules touch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInventory {
    /// database -> `db.schema`
    pub schemas: BTreeMap<String, Vec<String>>,
    /// `db.schema` -> `db.schema.table`
    pub tables: BTreeMap<String, Vec<String>>,
    /// `db.schema` -> `db.schema.view`
    pub views: BTreeMap<String, Vec<String>>,
}

fn listed(map: &BTreeMap<String, Vec<String>>, key: &str) -> Vec<String> {
    map.get(key).cloned().unwrap_or_default()
}

/// Treat a missing container as empty
fn or_empty(result: ConnectorResult<Vec<String>>, what: &str) -> ConnectorResult<Vec<String>> {
    match result {
        Err(ConnectorError::ObjectDoesNotExist(msg)) => {
            tracing::warn!(%what, %msg, "Container missing, treating as empty");
            Ok(Vec::new())
        }
        other => other,
    }
}

impl ObjectInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schemas_in(&self, database: &str) -> Vec<String> {
        listed(&self.schemas, database)
    }

    pub fn tables_in(&self, schema: &str) -> Vec<String> {
        listed(&self.tables, schema)
    }

    pub fn views_in(&self, schema: &str) -> Vec<String> {
        listed(&self.views, schema)
    }

    /// `db.*` becomes every listed schema of `db`; other names pass through
    pub fn expand_schema(&self, schema: &str) -> Vec<String> {
        match schema.split_once('.') {
            Some((database, "*")) => self.schemas_in(database),
            _ => vec![schema.to_string()],
        }
    }

    /// Fetch the listings needed by the roles a run will process
    pub async fn collect<C: Connector + ?Sized>(
        spec: &Spec,
        catalog: &EntityCatalog,
        connector: &C,
        options: &RunOptions,
    ) -> PermissionsResult<Self> {
        let mut inventory = ObjectInventory::new();
        if !options.run_list.includes(RunPhase::Roles) {
            return Ok(inventory);
        }

        let mut databases = BTreeSet::new();
        let mut table_refs = Vec::new();

        let roles = spec
            .roles
            .iter()
            .filter(|r| options.role_selected(&r.name))
            .filter_map(|r| r.config.as_ref());
        for config in roles {
            let privileged_schemas = config
                .privileges
                .schemas
                .all()
                .filter(|s| !is_shared(catalog, s));
            for schema in privileged_schemas.chain(config.owns.schemas.iter()) {
                if let Some((database, "*")) = schema.split_once('.') {
                    databases.insert(database.to_string());
                }
            }

            let privileged_tables = config
                .privileges
                .tables
                .all()
                .filter(|t| !is_shared(catalog, t));
            for table in privileged_tables.chain(config.owns.tables.iter()) {
                let parts: Vec<&str> = table.split('.').collect();
                if let [database, schema, _] = parts.as_slice() {
                    if *schema == "*" {
                        databases.insert(database.to_string());
                    }
                    table_refs.push(table.clone());
                }
            }
        }

        for database in &databases {
            let schemas = or_empty(connector.show_schemas(Some(database.as_str())).await, database)?;
            inventory.schemas.insert(database.clone(), schemas);
        }

        let mut containers = BTreeSet::new();
        for table in &table_refs {
            let parts: Vec<&str> = table.split('.').collect();
            if let [database, schema, _] = parts.as_slice() {
                if *schema == "*" {
                    containers.extend(inventory.schemas_in(database));
                } else {
                    containers.insert(format!("{}.{}", database, schema));
                }
            }
        }

        for schema in &containers {
            let tables = or_empty(connector.show_tables(Scope::Schema(schema)).await, schema)?;
            let views = or_empty(connector.show_views(Scope::Schema(schema)).await, schema)?;
            inventory.tables.insert(schema.clone(), tables);
            inventory.views.insert(schema.clone(), views);
        }

        Ok(inventory)
    }
}

fn is_shared(catalog: &EntityCatalog, name: &str) -> bool {
    let database = name.split('.').next().unwrap_or(name);
    catalog.shared_databases.contains(database)
}
