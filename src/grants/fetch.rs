//! Fetching grant state for tracked roles and users

use crate::catalog::EntityCatalog;
use crate::config::{RunOptions, RunPhase};
use crate::connector::{Connector, Scope};
use crate::error::PermissionsResult;

use super::filter::ScopeFilter;
use super::state::{GrantState, GrantStateBuilder};

/// Pulls current grants from the server
pub struct GrantStateFetcher<'a, C: Connector + ?Sized> {
    connector: &'a C,
}

impl<'a, C: Connector + ?Sized> GrantStateFetcher<'a, C> {
    pub fn new(connector: &'a C) -> Self {
        GrantStateFetcher { connector }
    }

    /// Fetch grant state scoped to `catalog`
    ///
    /// Users phase: roles granted to each tracked user, unless memberships
    /// are ignored. Roles phase: future grants on each tracked database and
    /// on every schema the server lists inside it, then direct grants for
    /// each tracked role unless memberships are ignored.
    pub async fn fetch(
        &self,
        catalog: &EntityCatalog,
        options: &RunOptions,
    ) -> PermissionsResult<GrantState> {
        let filter = ScopeFilter::new(catalog);
        let mut builder = GrantStateBuilder::new();

        if options.run_list.includes(RunPhase::Users) && !options.ignore_memberships {
            for user in catalog.users.iter().filter(|u| options.user_selected(u)) {
                tracing::debug!(%user, "Fetching roles granted to user");
                let roles = self.connector.show_roles_granted_to_user(user).await?;
                builder.user_roles(user, roles);
            }
        }

        if options.run_list.includes(RunPhase::Roles) {
            for database in &catalog.database_refs {
                tracing::debug!(%database, "Fetching future grants");
                let grants = self
                    .connector
                    .show_future_grants(Scope::Database(database))
                    .await?;
                for (role, privileges) in &grants {
                    if options.role_selected(role) {
                        builder.merge(role, privileges, &filter);
                    }
                }

                for schema in self.connector.show_schemas(Some(database.as_str())).await? {
                    let grants = self
                        .connector
                        .show_future_grants(Scope::Schema(&schema))
                        .await?;
                    for (role, privileges) in &grants {
                        if options.role_selected(role) {
                            builder.merge(role, privileges, &filter);
                        }
                    }
                }
            }

            if !options.ignore_memberships {
                for role in catalog.roles.iter().filter(|r| options.role_selected(r)) {
                    tracing::debug!(%role, "Fetching grants to role");
                    let grants = self.connector.show_grants_to_role(role).await?;
                    builder.merge(role, &grants, &filter);
                }
            }
        }

        Ok(builder.build())
    }
}
