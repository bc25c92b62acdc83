//! Shared test utilities
//!
//! Note: clippy reports false-positive dead_code warnings because it can't
//! trace usage across test binaries. These utilities are used by multiple tests.

#![allow(dead_code)]

use grantsmith::config::ADMIN_ROLE;
use grantsmith::connector::{AccountSnapshot, SnapshotConnector};
use grantsmith::spec::Spec;
use grantsmith::{LoadOptions, PermissionsResult, RunOptions, SpecLoader, SqlCommand};

/// Snapshot of an account reached as the administrator role
pub fn admin_snapshot() -> AccountSnapshot {
    AccountSnapshot::new()
        .current_user("grantsmith")
        .current_role(ADMIN_ROLE)
}

pub fn parse_spec(yaml: &str) -> Spec {
    Spec::from_yaml_str(yaml).expect("spec should parse")
}

/// Load `yaml` against `connector` with the given options
pub async fn load(
    yaml: &str,
    connector: &SnapshotConnector,
    options: &LoadOptions,
) -> PermissionsResult<SpecLoader> {
    SpecLoader::load(parse_spec(yaml), connector, options).await
}

/// Load and generate in one step, using the same run options for both
pub async fn plan(
    yaml: &str,
    snapshot: AccountSnapshot,
    run: RunOptions,
) -> PermissionsResult<Vec<SqlCommand>> {
    let connector = SnapshotConnector::new(snapshot);
    let options = LoadOptions::default().run(run.clone());
    let loader = load(yaml, &connector, &options).await?;
    loader.generate_permission_queries(&connector, &run).await
}

pub fn sql(commands: &[SqlCommand]) -> Vec<&str> {
    commands.iter().map(|c| c.sql.as_str()).collect()
}
