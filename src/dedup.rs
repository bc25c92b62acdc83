//! Removal of superseded ownership and revoke-all statements
//!
//! When the same ownership target or the same revoke-all statement appears
//! more than once, only the last occurrence is kept. Every other statement
//! passes through untouched and relative order is preserved.

use std::collections::HashSet;

use crate::sql::command::{OWNERSHIP_PREFIX, REVOKE_ALL_PREFIX, TO_ROLE_CLAUSE};
use crate::sql::SqlCommand;

/// Key identifying statements that supersede each other
fn supersede_key(sql: &str) -> Option<String> {
    if sql.starts_with(OWNERSHIP_PREFIX) {
        let target = sql.split(TO_ROLE_CLAUSE).next().unwrap_or(sql);
        return Some(format!("own:{}", target.trim_end()));
    }
    if sql.starts_with(REVOKE_ALL_PREFIX) {
        return Some(format!("revoke:{}", sql));
    }
    None
}

/// Keep the last ownership statement per target and the last copy of each
/// revoke-all statement
pub fn dedup(commands: Vec<SqlCommand>) -> Vec<SqlCommand> {
    let mut seen = HashSet::new();
    let mut kept: Vec<SqlCommand> = commands
        .into_iter()
        .rev()
        .filter(|command| match supersede_key(&command.sql) {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(sql: &str) -> SqlCommand {
        SqlCommand::new(sql, false)
    }

    const OWN: &str = "GRANT OWNERSHIP ON schema raw.public TO ROLE loader COPY CURRENT GRANTS";
    const REVOKE: &str = "REVOKE ALL PRIVILEGES ON schema raw.public FROM ROLE loader";

    #[test]
    fn test_duplicates_keep_last() {
        let commands = vec![cmd(OWN), cmd(OWN), cmd(REVOKE), cmd(REVOKE)];
        assert_eq!(dedup(commands), vec![cmd(OWN), cmd(REVOKE)]);
    }

    #[test]
    fn test_ownership_keyed_by_target() {
        let first = "GRANT OWNERSHIP ON table raw.public.t TO ROLE a COPY CURRENT GRANTS";
        let second = "GRANT OWNERSHIP ON table raw.public.t TO ROLE b COPY CURRENT GRANTS";
        let other = "GRANT OWNERSHIP ON table raw.public.u TO ROLE a COPY CURRENT GRANTS";
        let commands = vec![cmd(first), cmd(other), cmd(second)];
        assert_eq!(dedup(commands), vec![cmd(other), cmd(second)]);
    }

    #[test]
    fn test_other_statements_untouched() {
        let grant = "GRANT usage ON database raw TO ROLE loader";
        let commands = vec![cmd(grant), cmd(OWN), cmd(grant), cmd(OWN)];
        assert_eq!(dedup(commands), vec![cmd(grant), cmd(grant), cmd(OWN)]);
    }
}
