//! Grant state and its builder

use std::collections::BTreeMap;

use crate::connector::{PrivilegeGrants, RoleGrants};
use crate::sql::{ObjectKind, Privilege};

use super::filter::ScopeFilter;

/// Current grants for tracked roles and users
///
/// Read-only once built. Lookups for unknown grantees return empty results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantState {
    /// role -> privilege -> object kind -> names
    pub grants_to_role: RoleGrants,
    /// user -> granted roles
    pub roles_granted_to_user: BTreeMap<String, Vec<String>>,
}

impl GrantState {
    /// Whether `role` holds `privilege` on the `kind` object `name`
    pub fn is_granted(&self, role: &str, privilege: &str, kind: &str, name: &str) -> bool {
        self.granted(role, privilege, kind).iter().any(|n| n == name)
    }

    /// Names of `kind` objects on which `role` holds `privilege`
    pub fn granted(&self, role: &str, privilege: &str, kind: &str) -> &[String] {
        self.grants_to_role
            .get(role)
            .and_then(|p| p.get(privilege))
            .and_then(|k| k.get(kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Roles currently granted to `user`
    pub fn roles_granted_to_user(&self, user: &str) -> &[String] {
        self.roles_granted_to_user
            .get(user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Lowercase canonical privilege name; the server reports `USAGE`, `CREATE SCHEMA`
fn canonical_privilege(privilege: &str) -> String {
    match Privilege::parse(privilege) {
        Some(p) => p.to_str().to_string(),
        None => privilege.trim().to_lowercase(),
    }
}

fn canonical_kind(kind: &str) -> String {
    match ObjectKind::parse(kind) {
        Some(k) => k.to_str().to_string(),
        None => kind.trim().to_lowercase(),
    }
}

/// Accumulates grants from several sources
///
/// Insertion is additive and de-duplicated: a name is appended only if it is
/// not already present, so merge order never changes the set of grants.
#[derive(Debug, Default)]
pub struct GrantStateBuilder {
    state: GrantState,
}

impl GrantStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one grant; returns false if it was already present
    ///
    /// Privilege and kind names are stored lowercase whatever case they
    /// arrive in.
    pub fn record(&mut self, role: &str, privilege: &str, kind: &str, name: &str) -> bool {
        let names = self
            .state
            .grants_to_role
            .entry(role.to_string())
            .or_default()
            .entry(canonical_privilege(privilege))
            .or_default()
            .entry(canonical_kind(kind))
            .or_default();
        if names.iter().any(|n| n == name) {
            return false;
        }
        names.push(name.to_string());
        true
    }

    /// Merge a role's grants, keeping only names that pass `filter`
    pub fn merge(&mut self, role: &str, grants: &PrivilegeGrants, filter: &ScopeFilter<'_>) {
        for (privilege, kinds) in grants {
            for (kind, names) in kinds {
                let kind = canonical_kind(kind);
                for name in filter.filter_to_database_refs(&kind, names) {
                    self.record(role, privilege, &kind, &name);
                }
            }
        }
    }

    /// Set the roles granted to a user
    pub fn user_roles(&mut self, user: &str, roles: Vec<String>) {
        let entry = self
            .state
            .roles_granted_to_user
            .entry(user.to_string())
            .or_default();
        for role in roles {
            if !entry.contains(&role) {
                entry.push(role);
            }
        }
    }

    pub fn build(self) -> GrantState {
        self.state
    }
}
