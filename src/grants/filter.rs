//! Scoping of fetched grants to tracked objects
//!
//! `SHOW GRANTS` returns every grant a role holds, including grants on
//! objects the spec does not manage. Only names inside the tracked
//! boundary are kept.

use std::collections::BTreeSet;

use crate::catalog::EntityCatalog;

/// Filters grant targets against the catalog's ref sets
#[derive(Debug, Clone, Copy)]
pub struct ScopeFilter<'a> {
    database_refs: &'a BTreeSet<String>,
    warehouse_refs: &'a BTreeSet<String>,
    integration_refs: &'a BTreeSet<String>,
}

impl<'a> ScopeFilter<'a> {
    pub fn new(catalog: &'a EntityCatalog) -> Self {
        ScopeFilter {
            database_refs: &catalog.database_refs,
            warehouse_refs: &catalog.warehouse_refs,
            integration_refs: &catalog.integration_refs,
        }
    }

    /// Keep the names of `grant_on` objects that are in scope, in order
    ///
    /// - `database`, `warehouse`, `integration`: name must be a tracked ref
    /// - `account`: unfiltered
    /// - anything else: a dotted name's first segment must be a tracked
    ///   database; undotted names always pass
    pub fn filter_to_database_refs(&self, grant_on: &str, names: &[String]) -> Vec<String> {
        let keep = |name: &&String| -> bool {
            match grant_on {
                "database" => self.database_refs.contains(name.as_str()),
                "warehouse" => self.warehouse_refs.contains(name.as_str()),
                "integration" => self.integration_refs.contains(name.as_str()),
                "account" => true,
                _ => match name.split_once('.') {
                    Some((database, _)) => self.database_refs.contains(database),
                    None => !name.is_empty(),
                },
            }
        };
        names.iter().filter(keep).cloned().collect()
    }
}
