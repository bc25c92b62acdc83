//! User statements: attribute updates then role memberships

use crate::spec::UserConfig;
use crate::sql::{quote_literal, Grantee, SqlCommand, Statement};

use super::{CommandGenerator, GenerationContext};

/// Generator for `users` entries
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCommands;

/// `ALTER USER` assignments for the attributes a user declares
fn assignments(config: &UserConfig) -> Vec<String> {
    let mut assignments = Vec::new();
    if let Some(can_login) = config.can_login {
        let disabled = if can_login { "FALSE" } else { "TRUE" };
        assignments.push(format!("DISABLED = {}", disabled));
    }

    let attributes = [
        ("DISPLAY_NAME", &config.display_name),
        ("FIRST_NAME", &config.first_name),
        ("MIDDLE_NAME", &config.middle_name),
        ("LAST_NAME", &config.last_name),
        ("EMAIL", &config.email),
        ("COMMENT", &config.comment),
        ("DEFAULT_WAREHOUSE", &config.default_warehouse),
        ("DEFAULT_NAMESPACE", &config.default_namespace),
        ("DEFAULT_ROLE", &config.default_role),
    ];
    for (attribute, value) in attributes {
        if let Some(value) = value {
            assignments.push(format!("{} = {}", attribute, quote_literal(value)));
        }
    }
    assignments
}

impl CommandGenerator for UserCommands {
    type Config = UserConfig;

    fn generate_commands(
        &self,
        user: &str,
        config: &UserConfig,
        ctx: &GenerationContext<'_>,
    ) -> Vec<SqlCommand> {
        if ctx.ignore_memberships {
            return Vec::new();
        }

        let mut commands = Vec::new();
        let assignments = assignments(config);
        if !assignments.is_empty() {
            let statement = Statement::AlterUser {
                name: user,
                assignments: &assignments,
            };
            commands.push(SqlCommand::from_statement(&statement, false));
        }

        let granted = ctx.grants.roles_granted_to_user(user);
        let mut members: Vec<&String> = Vec::new();
        for role in &config.member_of {
            if !members.contains(&role) {
                members.push(role);
            }
        }
        for role in members.iter().copied() {
            let statement = Statement::GrantRole {
                role,
                grantee: Grantee::User,
                name: user,
            };
            commands.push(SqlCommand::from_statement(&statement, granted.contains(role)));
        }

        for role in granted {
            if members.contains(&role) {
                continue;
            }
            let statement = Statement::RevokeRole {
                role,
                grantee: Grantee::User,
                name: user,
            };
            commands.push(SqlCommand::from_statement(&statement, false));
        }

        commands
    }
}
