//! Entity validation against the live account
//!
//! Every tracked entity class is checked with one listing query. Classes
//! with nothing tracked are skipped without touching the connector. Names
//! containing `*` are wildcard refs and are never checked.
//!
//! Missing entities either fail the run (all errors reported at once) or,
//! in ignore-missing mode, are pruned from a copy of the catalog and spec.
//! Role owner mismatches always fail.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::EntityCatalog;
use crate::config::ADMIN_ROLE;
use crate::connector::{Connector, ConnectorError, Scope};
use crate::error::{EntityClass, EntityError, PermissionsError, PermissionsResult};
use crate::spec::Spec;

/// Outcome of checking a catalog against the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Missing names per entity class
    pub missing: BTreeMap<EntityClass, Vec<String>>,
    /// Every error found, in check order
    pub errors: Vec<EntityError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record_missing(&mut self, class: EntityClass, name: &str) {
        self.missing
            .entry(class)
            .or_default()
            .push(name.to_string());
        self.errors.push(EntityError::Missing {
            class,
            name: name.to_string(),
        });
    }

    /// Errors that pruning cannot resolve
    pub fn owner_mismatches(&self) -> Vec<EntityError> {
        self.errors
            .iter()
            .filter(|e| !e.is_missing())
            .cloned()
            .collect()
    }

    /// Missing names of one class
    pub fn missing(&self, class: EntityClass) -> &[String] {
        self.missing.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Checks spec entities against the server through a connector
pub struct EntityValidator<'a, C: Connector + ?Sized> {
    connector: &'a C,
}

impl<'a, C: Connector + ?Sized> EntityValidator<'a, C> {
    pub fn new(connector: &'a C) -> Self {
        EntityValidator { connector }
    }

    /// Fail unless the connection runs as the administrator role
    pub async fn check_permissions(&self) -> PermissionsResult<()> {
        let user = self.connector.current_user().await?;
        tracing::info!("Current user is: {}", user);
        let current = self.connector.current_role().await?;
        if current != ADMIN_ROLE {
            return Err(PermissionsError::Permission {
                expected: ADMIN_ROLE.to_string(),
                actual: current,
            });
        }
        Ok(())
    }

    /// Check every tracked entity class and collect what is wrong
    pub async fn validate(
        &self,
        catalog: &EntityCatalog,
        spec: &Spec,
    ) -> PermissionsResult<ValidationReport> {
        let mut report = ValidationReport::default();

        if catalog.warehouses.is_empty() {
            tracing::debug!("No warehouses tracked, skipping existence check");
        } else {
            let existing = self.connector.show_warehouses().await?;
            check_names(&mut report, EntityClass::Warehouse, &catalog.warehouses, &existing);
        }

        if catalog.integrations.is_empty() {
            tracing::debug!("No integrations tracked, skipping existence check");
        } else {
            let existing = self.connector.show_integrations().await?;
            check_names(
                &mut report,
                EntityClass::Integration,
                &catalog.integrations,
                &existing,
            );
        }

        if catalog.databases.is_empty() {
            tracing::debug!("No databases tracked, skipping existence check");
        } else {
            let existing = self.connector.show_databases().await?;
            check_names(&mut report, EntityClass::Database, &catalog.databases, &existing);
        }

        if catalog.schema_refs.is_empty() {
            tracing::debug!("No schemas tracked, skipping existence check");
        } else {
            let existing = self.connector.show_schemas(None).await?;
            check_names(&mut report, EntityClass::Schema, &catalog.schema_refs, &existing);
        }

        if catalog.table_refs.is_empty() {
            tracing::debug!("No tables tracked, skipping existence check");
        } else {
            self.check_tables(&mut report, catalog).await?;
        }

        if catalog.roles.is_empty() {
            tracing::debug!("No roles tracked, skipping existence check");
        } else {
            let existing = self.connector.show_roles().await?;
            for name in &catalog.roles {
                match existing.get(name) {
                    None => report.record_missing(EntityClass::Role, name),
                    Some(server_owner) => {
                        let spec_owner = spec.role(name).and_then(|r| r.owner());
                        if let Some(spec_owner) = spec_owner {
                            if spec_owner != server_owner.as_str() {
                                report.errors.push(EntityError::OwnerMismatch {
                                    role: name.clone(),
                                    server_owner: server_owner.clone(),
                                    spec_owner: spec_owner.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        if catalog.users.is_empty() {
            tracing::debug!("No users tracked, skipping existence check");
        } else {
            let existing = self.connector.show_users().await?;
            check_names(&mut report, EntityClass::User, &catalog.users, &existing);
        }

        Ok(report)
    }

    /// Tables and views are listed per database; databases that do not
    /// exist are left to the database check.
    async fn check_tables(
        &self,
        report: &mut ValidationReport,
        catalog: &EntityCatalog,
    ) -> PermissionsResult<()> {
        let views: BTreeSet<String> = self
            .connector
            .show_views(Scope::Account)
            .await?
            .into_iter()
            .collect();

        for (database, tables) in &catalog.tables_by_database {
            let existing: BTreeSet<String> =
                match self.connector.show_tables(Scope::Database(database)).await {
                    Ok(tables) => tables.into_iter().collect(),
                    Err(ConnectorError::ObjectDoesNotExist(msg)) => {
                        tracing::warn!(%database, %msg, "Skipping table check for missing database");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

            for table in tables {
                if table.contains('*') || existing.contains(table) || views.contains(table) {
                    continue;
                }
                report.record_missing(EntityClass::Table, table);
            }
        }
        Ok(())
    }

    /// Validate and apply the missing-entity policy
    ///
    /// Returns the catalog and spec to use for the rest of the run: the
    /// inputs unchanged when everything exists, or pruned copies in
    /// ignore-missing mode.
    pub async fn check_entities(
        &self,
        catalog: &EntityCatalog,
        spec: &Spec,
        ignore_missing: bool,
    ) -> PermissionsResult<(EntityCatalog, Spec)> {
        let report = self.validate(catalog, spec).await?;

        if report.is_clean() {
            return Ok((catalog.clone(), spec.clone()));
        }

        if !ignore_missing {
            return Err(PermissionsError::Validation(report.errors));
        }

        let mismatches = report.owner_mismatches();
        if !mismatches.is_empty() {
            return Err(PermissionsError::Validation(mismatches));
        }

        Ok(reconcile(catalog, spec, &report))
    }
}

fn check_names(
    report: &mut ValidationReport,
    class: EntityClass,
    tracked: &BTreeSet<String>,
    existing: &[String],
) {
    let existing: BTreeSet<&str> = existing.iter().map(String::as_str).collect();
    for name in tracked {
        if name.contains('*') || existing.contains(name.as_str()) {
            continue;
        }
        report.record_missing(class, name);
    }
}

/// Prune every missing entity from copies of the catalog and spec
///
/// Databases leave `databases`, `database_refs` and every ref inside them.
/// Roles additionally leave every `member_of` list so no later stage can
/// reference them.
pub fn reconcile(
    catalog: &EntityCatalog,
    spec: &Spec,
    report: &ValidationReport,
) -> (EntityCatalog, Spec) {
    let mut catalog = catalog.clone();
    let mut spec = spec.clone();

    for (class, names) in &report.missing {
        for name in names {
            prune(&mut catalog, &mut spec, *class, name);
            tracing::info!("Ignored missing {} {}", class.noun(), name);
        }
    }

    (catalog, spec)
}

fn role_configs(spec: &mut Spec) -> impl Iterator<Item = &mut crate::spec::RoleConfig> {
    spec.roles.iter_mut().filter_map(|r| r.config.as_mut())
}

fn prune(catalog: &mut EntityCatalog, spec: &mut Spec, class: EntityClass, name: &str) {
    match class {
        EntityClass::Warehouse => {
            catalog.warehouses.remove(name);
            catalog.warehouse_refs.remove(name);
            spec.warehouses.retain(|w| w.name != name);
            for role in role_configs(spec) {
                role.warehouses.retain(|w| w != name);
            }
        }
        EntityClass::Integration => {
            catalog.integrations.remove(name);
            catalog.integration_refs.remove(name);
            spec.integrations.retain(|i| i.name != name);
            for role in role_configs(spec) {
                role.integrations.retain(|i| i != name);
            }
        }
        EntityClass::Database => {
            let prefix = format!("{name}.");
            catalog.databases.remove(name);
            catalog.database_refs.remove(name);
            catalog.shared_databases.remove(name);
            catalog.schema_refs.retain(|s| !s.starts_with(&prefix));
            catalog.table_refs.retain(|t| !t.starts_with(&prefix));
            catalog.tables_by_database.remove(name);
            spec.databases.retain(|d| d.name != name);
            for role in role_configs(spec) {
                role.forget_database(name);
            }
        }
        EntityClass::Schema => {
            catalog.schema_refs.remove(name);
            for role in role_configs(spec) {
                role.forget_schema(name);
            }
        }
        EntityClass::Table => {
            catalog.table_refs.remove(name);
            for tables in catalog.tables_by_database.values_mut() {
                tables.retain(|t| t != name);
            }
            catalog.tables_by_database.retain(|_, tables| !tables.is_empty());
            for role in role_configs(spec) {
                role.forget_table(name);
            }
        }
        EntityClass::Role => {
            catalog.roles.remove(name);
            spec.roles.retain(|r| r.name != name);
            for role in role_configs(spec) {
                role.member_of.forget(name);
            }
            for user in spec.users.iter_mut().filter_map(|u| u.config.as_mut()) {
                user.member_of.retain(|r| r != name);
            }
        }
        EntityClass::User => {
            catalog.users.remove(name);
            spec.users.retain(|u| u.name != name);
        }
    }
}
