//! grantsmith - access-control-as-code for SQL data warehouse accounts
//!
//! Features:
//! - Declarative YAML spec of roles, users, warehouses, integrations and databases
//! - Existence validation with optional pruning of missing entities
//! - Grant state fetch scoped to the objects a spec manages
//! - Grant/revoke/alter generation tagged with already-granted state

pub mod catalog;
pub mod config;
pub mod connector;
pub mod dedup;
pub mod error;
pub mod generate;
pub mod grants;
pub mod loader;
pub mod spec;
pub mod sql;
pub mod validate;

pub use config::{LoadOptions, RunList, RunOptions, RunPhase};
pub use error::{PermissionsError, PermissionsResult};
pub use loader::SpecLoader;
pub use sql::SqlCommand;
