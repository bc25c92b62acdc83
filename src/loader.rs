//! Run orchestration
//!
//! Loading walks the pipeline up to grant state: administrator check, entity
//! cataloging, existence validation (with optional pruning), and grant
//! fetch. Query generation then expands wildcards, diffs, and de-duplicates.

use std::path::Path;

use crate::catalog::{inspect_entities, EntityCatalog};
use crate::config::{LoadOptions, RunOptions};
use crate::connector::Connector;
use crate::dedup::dedup;
use crate::error::PermissionsResult;
use crate::generate::generate;
use crate::grants::{GrantState, GrantStateFetcher, ObjectInventory};
use crate::spec::Spec;
use crate::sql::{SqlCommand, PRIVILEGE_TABLE_VERSION};
use crate::validate::EntityValidator;

/// A validated spec together with the account's current grants
#[derive(Debug, Clone)]
pub struct SpecLoader {
    spec: Spec,
    catalog: EntityCatalog,
    grants: GrantState,
}

impl SpecLoader {
    /// Validate `spec` against the account and fetch its grant state
    pub async fn load<C: Connector + ?Sized>(
        spec: Spec,
        connector: &C,
        options: &LoadOptions,
    ) -> PermissionsResult<Self> {
        let validator = EntityValidator::new(connector);
        validator.check_permissions().await?;

        let catalog = inspect_entities(&spec)?;
        let (catalog, spec) = validator
            .check_entities(&catalog, &spec, options.ignore_missing_entities)
            .await?;
        tracing::info!(
            roles = spec.roles.len(),
            users = spec.users.len(),
            "Spec validated against account"
        );

        let grants = if options.skip_grant_fetch {
            GrantState::default()
        } else {
            GrantStateFetcher::new(connector)
                .fetch(&catalog, &options.run)
                .await?
        };

        Ok(SpecLoader {
            spec,
            catalog,
            grants,
        })
    }

    /// Read a spec file and load it
    pub async fn from_path<C: Connector + ?Sized>(
        path: impl AsRef<Path>,
        connector: &C,
        options: &LoadOptions,
    ) -> PermissionsResult<Self> {
        let spec = Spec::from_path(path)?;
        Self::load(spec, connector, options).await
    }

    /// Spec after validation (pruned in ignore-missing mode)
    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn grants(&self) -> &GrantState {
        &self.grants
    }

    /// Statements converging the account onto the declared permissions
    ///
    /// Role and user allow-lists in `options` are applied independently. The
    /// connector is only used to list objects that wildcard rules expand to.
    pub async fn generate_permission_queries<C: Connector + ?Sized>(
        &self,
        connector: &C,
        options: &RunOptions,
    ) -> PermissionsResult<Vec<SqlCommand>> {
        let inventory =
            ObjectInventory::collect(&self.spec, &self.catalog, connector, options).await?;
        let commands = generate(
            &self.spec,
            &self.catalog,
            &self.grants,
            &inventory,
            options,
        );
        let total = commands.len();
        let commands = dedup(commands);
        tracing::info!(
            generated = total,
            kept = commands.len(),
            pending = commands.iter().filter(|c| !c.already_granted).count(),
            privilege_table = PRIVILEGE_TABLE_VERSION,
            "Generated permission queries"
        );
        Ok(commands)
    }
}
