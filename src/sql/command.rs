//! Generated statements
//!
//! [`Statement`] renders the fixed statement templates; [`SqlCommand`] is
//! the rendered text plus whether its effect is already in place.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::privileges::{join, ObjectKind, Privilege};

/// Prefix of ownership transfer statements
pub const OWNERSHIP_PREFIX: &str = "GRANT OWNERSHIP ON";

/// Prefix of revoke-all statements
pub const REVOKE_ALL_PREFIX: &str = "REVOKE ALL";

/// Clause introducing the grantee role
pub const TO_ROLE_CLAUSE: &str = "TO ROLE";

/// A generated statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlCommand {
    pub sql: String,
    /// Effect of `sql` is already present in the fetched grant state
    pub already_granted: bool,
}

impl SqlCommand {
    pub fn new(sql: impl Into<String>, already_granted: bool) -> Self {
        SqlCommand {
            sql: sql.into(),
            already_granted,
        }
    }

    pub fn from_statement(statement: &Statement<'_>, already_granted: bool) -> Self {
        Self::new(statement.to_string(), already_granted)
    }
}

/// Recipient of a role membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grantee {
    Role,
    User,
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grantee::Role => "role",
            Grantee::User => "user",
        })
    }
}

/// Statement templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    /// `GRANT ROLE r TO role|user name`
    GrantRole {
        role: &'a str,
        grantee: Grantee,
        name: &'a str,
    },
    /// `REVOKE ROLE r FROM role|user name`
    RevokeRole {
        role: &'a str,
        grantee: Grantee,
        name: &'a str,
    },
    /// `GRANT privs ON kind name TO ROLE role`
    Grant {
        privileges: &'a [Privilege],
        kind: ObjectKind,
        name: &'a str,
        role: &'a str,
    },
    /// `REVOKE privs ON kind name FROM ROLE role`
    Revoke {
        privileges: &'a [Privilege],
        kind: ObjectKind,
        name: &'a str,
        role: &'a str,
    },
    /// `GRANT privs ON FUTURE kinds IN database|schema container TO ROLE role`
    GrantFuture {
        privileges: &'a [Privilege],
        kind: ObjectKind,
        container_kind: ObjectKind,
        container: &'a str,
        role: &'a str,
    },
    /// `REVOKE privs ON FUTURE kinds IN database|schema container FROM ROLE role`
    RevokeFuture {
        privileges: &'a [Privilege],
        kind: ObjectKind,
        container_kind: ObjectKind,
        container: &'a str,
        role: &'a str,
    },
    /// `GRANT OWNERSHIP ON kind name TO ROLE role COPY CURRENT GRANTS`
    GrantOwnership {
        kind: ObjectKind,
        name: &'a str,
        role: &'a str,
    },
    /// `ALTER USER name SET a = x, b = y`
    AlterUser {
        name: &'a str,
        assignments: &'a [String],
    },
}

impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::GrantRole {
                role,
                grantee,
                name,
            } => write!(f, "GRANT ROLE {} TO {} {}", role, grantee, name),
            Statement::RevokeRole {
                role,
                grantee,
                name,
            } => write!(f, "REVOKE ROLE {} FROM {} {}", role, grantee, name),
            Statement::Grant {
                privileges,
                kind,
                name,
                role,
            } => write!(
                f,
                "GRANT {} ON {} {} {} {}",
                join(privileges),
                kind,
                name,
                TO_ROLE_CLAUSE,
                role
            ),
            Statement::Revoke {
                privileges,
                kind,
                name,
                role,
            } => write!(
                f,
                "REVOKE {} ON {} {} FROM ROLE {}",
                join(privileges),
                kind,
                name,
                role
            ),
            Statement::GrantFuture {
                privileges,
                kind,
                container_kind,
                container,
                role,
            } => write!(
                f,
                "GRANT {} ON FUTURE {}s IN {} {} {} {}",
                join(privileges),
                kind,
                container_kind,
                container,
                TO_ROLE_CLAUSE,
                role
            ),
            Statement::RevokeFuture {
                privileges,
                kind,
                container_kind,
                container,
                role,
            } => write!(
                f,
                "REVOKE {} ON FUTURE {}s IN {} {} FROM ROLE {}",
                join(privileges),
                kind,
                container_kind,
                container,
                role
            ),
            Statement::GrantOwnership { kind, name, role } => write!(
                f,
                "{} {} {} {} {} COPY CURRENT GRANTS",
                OWNERSHIP_PREFIX, kind, name, TO_ROLE_CLAUSE, role
            ),
            Statement::AlterUser { name, assignments } => {
                write!(f, "ALTER USER {} SET {}", name, assignments.join(", "))
            }
        }
    }
}

/// Quote a string literal, doubling embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
