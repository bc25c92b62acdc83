//! Privilege diff engine
//!
//! Turns spec roles and users into the statements that converge the
//! account onto the spec, tagging each with whether the fetched grant state
//! already reflects it. Generation is a pure function of its inputs; any
//! object listings it needs come from an [`ObjectInventory`] fetched
//! beforehand.
//!
//! Sections are processed in document order. Only `roles` and `users`
//! produce statements; the other sections describe objects, not grantees.

mod role;
mod user;

pub use role::RoleCommands;
pub use user::UserCommands;

use crate::catalog::EntityCatalog;
use crate::config::{RunOptions, RunPhase};
use crate::grants::{GrantState, ObjectInventory};
use crate::spec::{MemberOf, SectionKind, Spec};
use crate::sql::{Privilege, SqlCommand};

/// Read-only inputs shared by every generator
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub catalog: &'a EntityCatalog,
    pub grants: &'a GrantState,
    pub inventory: &'a ObjectInventory,
    /// Declared role names, the universe for `*` memberships
    pub all_roles: &'a [String],
    pub ignore_memberships: bool,
}

impl GenerationContext<'_> {
    /// Whether `role` already holds every privilege on `name`
    pub fn holds_all(&self, role: &str, privileges: &[Privilege], kind: &str, name: &str) -> bool {
        !privileges.is_empty()
            && privileges
                .iter()
                .all(|p| self.grants.is_granted(role, p.to_str(), kind, name))
    }

    /// Database is declared in the spec and not shared
    ///
    /// Revocations are limited to managed databases.
    pub fn manages(&self, database: &str) -> bool {
        self.catalog.databases.contains(database) && !self.is_shared(database)
    }

    pub fn is_shared(&self, database: &str) -> bool {
        self.catalog.shared_databases.contains(database)
    }
}

/// Statement generation for one kind of grantee
pub trait CommandGenerator {
    type Config;

    /// Statements establishing `config` for the entity `name`
    fn generate_commands(
        &self,
        name: &str,
        config: &Self::Config,
        ctx: &GenerationContext<'_>,
    ) -> Vec<SqlCommand>;
}

/// Resolve membership targets
///
/// `*` stands for every declared role except `exclude_self`; excluded names
/// are removed afterwards.
pub fn resolve_members(
    member_of: &MemberOf,
    all_roles: &[String],
    exclude_self: Option<&str>,
) -> Vec<String> {
    let (include, exclude) = match member_of {
        MemberOf::List(roles) => (roles.as_slice(), &[][..]),
        MemberOf::Filter { include, exclude } => (include.as_slice(), exclude.as_slice()),
    };

    let mut members: Vec<String> = Vec::new();
    for name in include {
        if name == "*" {
            for role in all_roles {
                if Some(role.as_str()) != exclude_self && !members.contains(role) {
                    members.push(role.clone());
                }
            }
        } else if !members.contains(name) {
            members.push(name.clone());
        }
    }
    members.retain(|m| !exclude.contains(m));
    members
}

/// Generate statements for every selected role and user, in document order
pub fn generate(
    spec: &Spec,
    catalog: &EntityCatalog,
    grants: &GrantState,
    inventory: &ObjectInventory,
    options: &RunOptions,
) -> Vec<SqlCommand> {
    let all_roles = spec.role_names();
    let ctx = GenerationContext {
        catalog,
        grants,
        inventory,
        all_roles: &all_roles,
        ignore_memberships: options.ignore_memberships,
    };

    let mut commands = Vec::new();
    for section in &spec.order {
        match section {
            SectionKind::Roles if options.run_list.includes(RunPhase::Roles) => {
                for entity in spec.roles.iter().filter(|r| options.role_selected(&r.name)) {
                    let Some(config) = &entity.config else {
                        tracing::debug!(role = %entity.name, "Role has no config, skipping");
                        continue;
                    };
                    tracing::debug!(role = %entity.name, "Generating role statements");
                    commands.extend(RoleCommands.generate_commands(&entity.name, config, &ctx));
                }
            }
            SectionKind::Users if options.run_list.includes(RunPhase::Users) => {
                for entity in spec.users.iter().filter(|u| options.user_selected(&u.name)) {
                    let Some(config) = &entity.config else {
                        tracing::debug!(user = %entity.name, "User has no config, skipping");
                        continue;
                    };
                    tracing::debug!(user = %entity.name, "Generating user statements");
                    commands.extend(UserCommands.generate_commands(&entity.name, config, &ctx));
                }
            }
            _ => {}
        }
    }
    commands
}
