//! Run configuration
//!
//! Options controlling which parts of a spec are reconciled and how strict
//! validation is. Values come from the environment and may be overridden by
//! command-line flags.
//!
//! Environment Variables:
//! - `GRANTSMITH_IGNORE_MISSING` - prune missing entities instead of failing
//! - `GRANTSMITH_IGNORE_MEMBERSHIPS` - leave role memberships and user attributes alone
//! - `GRANTSMITH_RUN_LIST` - comma-separated phases (`users`, `roles`)
//! - `GRANTSMITH_ROLES` - comma-separated role allow-list
//! - `GRANTSMITH_USERS` - comma-separated user allow-list

use std::env;
use std::fmt;

use crate::error::{PermissionsError, PermissionsResult};
use crate::spec::parse_flag;

/// Role the connection must be operating under
pub const ADMIN_ROLE: &str = "securityadmin";

/// Phases a run can process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunPhase {
    Users,
    Roles,
}

impl RunPhase {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "users" => Some(RunPhase::Users),
            "roles" => Some(RunPhase::Roles),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Users => "users",
            RunPhase::Roles => "roles",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected run phases; empty means every phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunList(Vec<RunPhase>);

impl RunList {
    pub fn new(phases: impl IntoIterator<Item = RunPhase>) -> Self {
        let mut list = Vec::new();
        for phase in phases {
            if !list.contains(&phase) {
                list.push(phase);
            }
        }
        RunList(list)
    }

    /// Both phases
    pub fn all() -> Self {
        RunList(vec![RunPhase::Users, RunPhase::Roles])
    }

    /// Parse a comma-separated phase list
    pub fn parse(s: &str) -> PermissionsResult<Self> {
        let mut phases = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let phase = RunPhase::parse(part).ok_or_else(|| {
                PermissionsError::Configuration(vec![format!(
                    "Unknown run list entry '{}', expected 'users' or 'roles'",
                    part
                )])
            })?;
            phases.push(phase);
        }
        Ok(RunList::new(phases))
    }

    pub fn includes(&self, phase: RunPhase) -> bool {
        self.0.is_empty() || self.0.contains(&phase)
    }
}

fn env_flag(name: &str) -> PermissionsResult<bool> {
    match env::var(name) {
        Ok(value) => parse_flag(&value).ok_or_else(|| {
            PermissionsError::Configuration(vec![format!(
                "{} must be a boolean, found '{}'",
                name, value
            )])
        }),
        Err(_) => Ok(false),
    }
}

fn env_names(name: &str) -> Option<Vec<String>> {
    let value = env::var(name).ok()?;
    let names: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect();
    (!names.is_empty()).then_some(names)
}

fn selected(filter: &Option<Vec<String>>, name: &str) -> bool {
    match filter {
        Some(names) if !names.is_empty() => names.iter().any(|n| n == name),
        _ => true,
    }
}

/// Which roles/users to process and how
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Role allow-list; `None` or empty processes every role
    pub roles: Option<Vec<String>>,
    /// User allow-list; `None` or empty processes every user
    pub users: Option<Vec<String>>,
    pub run_list: RunList,
    /// Skip membership grants/revokes and user attribute updates
    pub ignore_memberships: bool,
}

impl RunOptions {
    /// Read options from environment variables
    pub fn from_env() -> PermissionsResult<Self> {
        let run_list = match env::var("GRANTSMITH_RUN_LIST") {
            Ok(value) => RunList::parse(&value)?,
            Err(_) => RunList::default(),
        };
        Ok(RunOptions {
            roles: env_names("GRANTSMITH_ROLES"),
            users: env_names("GRANTSMITH_USERS"),
            run_list,
            ignore_memberships: env_flag("GRANTSMITH_IGNORE_MEMBERSHIPS")?,
        })
    }

    #[must_use]
    pub fn roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn users(mut self, users: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.users = Some(users.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn run_list(mut self, run_list: RunList) -> Self {
        self.run_list = run_list;
        self
    }

    #[must_use]
    pub fn ignore_memberships(mut self, ignore: bool) -> Self {
        self.ignore_memberships = ignore;
        self
    }

    pub fn role_selected(&self, name: &str) -> bool {
        selected(&self.roles, name)
    }

    pub fn user_selected(&self, name: &str) -> bool {
        selected(&self.users, name)
    }
}

/// Options for loading and validating a spec against an account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Prune entities missing on the server instead of failing
    pub ignore_missing_entities: bool,
    /// Validate only; do not fetch grant state
    pub skip_grant_fetch: bool,
    pub run: RunOptions,
}

impl LoadOptions {
    /// Read options from environment variables
    pub fn from_env() -> PermissionsResult<Self> {
        Ok(LoadOptions {
            ignore_missing_entities: env_flag("GRANTSMITH_IGNORE_MISSING")?,
            skip_grant_fetch: false,
            run: RunOptions::from_env()?,
        })
    }

    #[must_use]
    pub fn ignore_missing_entities(mut self, ignore: bool) -> Self {
        self.ignore_missing_entities = ignore;
        self
    }

    #[must_use]
    pub fn skip_grant_fetch(mut self, skip: bool) -> Self {
        self.skip_grant_fetch = skip;
        self
    }

    #[must_use]
    pub fn run(mut self, run: RunOptions) -> Self {
        self.run = run;
        self
    }
}
