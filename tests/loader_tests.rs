//! End-to-end reconciliation tests against snapshot accounts

mod test_utils;

use std::io::Write;

use grantsmith::connector::SnapshotConnector;
use grantsmith::{LoadOptions, PermissionsError, RunList, RunOptions, RunPhase, SpecLoader};
use tempfile::NamedTempFile;

use test_utils::{admin_snapshot, load, plan, sql};

const MEMBERSHIP_SPEC: &str = r#"
roles:
  - primary:
      member_of: [testrole]
  - secondary:
      member_of: [testrole]
users:
  - testusername:
      can_login: yes
      member_of: [primary]
"#;

fn membership_account() -> grantsmith::connector::AccountSnapshot {
    admin_snapshot()
        .role("primary", "securityadmin")
        .role("secondary", "securityadmin")
        .role("testrole", "securityadmin")
        .user("testusername")
}

// ============ Filter Tests ============

#[tokio::test]
async fn test_role_filter_limits_role_statements() {
    let run = RunOptions::default()
        .roles(["primary"])
        .run_list(RunList::new([RunPhase::Roles]));
    let commands = plan(MEMBERSHIP_SPEC, membership_account(), run)
        .await
        .unwrap();

    assert_eq!(sql(&commands), vec!["GRANT ROLE testrole TO role primary"]);
    assert!(!commands[0].already_granted);
}

#[tokio::test]
async fn test_role_filter_does_not_suppress_users() {
    let run = RunOptions::default().roles(["primary"]);
    let commands = plan(MEMBERSHIP_SPEC, membership_account(), run)
        .await
        .unwrap();

    assert_eq!(
        sql(&commands),
        vec![
            "GRANT ROLE testrole TO role primary",
            "ALTER USER testusername SET DISABLED = FALSE",
            "GRANT ROLE primary TO user testusername",
        ]
    );
}

#[tokio::test]
async fn test_users_run_list() {
    let run = RunOptions::default().run_list(RunList::new([RunPhase::Users]));
    let commands = plan(MEMBERSHIP_SPEC, membership_account(), run)
        .await
        .unwrap();

    assert_eq!(
        sql(&commands),
        vec![
            "ALTER USER testusername SET DISABLED = FALSE",
            "GRANT ROLE primary TO user testusername",
        ]
    );
}

#[tokio::test]
async fn test_ignore_memberships() {
    let run = RunOptions::default().ignore_memberships(true);
    let commands = plan(MEMBERSHIP_SPEC, membership_account(), run)
        .await
        .unwrap();
    assert!(commands.is_empty());
}

// ============ Grant State Tests ============

#[tokio::test]
async fn test_existing_grants_are_flagged() {
    let account = membership_account()
        .grant("primary", "usage", "role", "testrole")
        .grant("secondary", "usage", "role", "retired")
        .user_role("testusername", "primary");
    let commands = plan(MEMBERSHIP_SPEC, account, RunOptions::default())
        .await
        .unwrap();

    let flagged: Vec<(&str, bool)> = commands
        .iter()
        .map(|c| (c.sql.as_str(), c.already_granted))
        .collect();
    assert_eq!(
        flagged,
        vec![
            ("GRANT ROLE testrole TO role primary", true),
            ("GRANT ROLE testrole TO role secondary", false),
            ("REVOKE ROLE retired FROM role secondary", false),
            ("ALTER USER testusername SET DISABLED = FALSE", false),
            ("GRANT ROLE primary TO user testusername", true),
        ]
    );
}

#[tokio::test]
async fn test_generation_is_repeatable() {
    let connector = SnapshotConnector::new(membership_account());
    let loader = load(MEMBERSHIP_SPEC, &connector, &LoadOptions::default())
        .await
        .unwrap();
    let run = RunOptions::default();

    let first = loader
        .generate_permission_queries(&connector, &run)
        .await
        .unwrap();
    let second = loader
        .generate_permission_queries(&connector, &run)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_database_privileges() {
    let yaml = r#"
databases:
  - database_1:
      shared: no
roles:
  - test_role:
      privileges:
        databases:
          write: [database_1]
"#;
    let account = admin_snapshot()
        .database("database_1")
        .role("test_role", "securityadmin");
    let commands = plan(yaml, account, RunOptions::default()).await.unwrap();
    assert_eq!(
        sql(&commands),
        vec!["GRANT usage, monitor, create schema ON database database_1 TO ROLE test_role"]
    );
}

#[tokio::test]
async fn test_schema_table_wildcard_expands_against_account() {
    let yaml = r#"
databases:
  - raw
roles:
  - analyst:
      privileges:
        tables:
          read: [raw.public.*]
"#;
    let account = admin_snapshot()
        .database("raw")
        .schema("raw.public")
        .table("raw.public.orders")
        .view("raw.public.orders_v")
        .role("analyst", "securityadmin");
    let commands = plan(yaml, account, RunOptions::default()).await.unwrap();
    assert_eq!(
        sql(&commands),
        vec![
            "GRANT select ON FUTURE tables IN schema raw.public TO ROLE analyst",
            "GRANT select ON FUTURE views IN schema raw.public TO ROLE analyst",
            "GRANT select ON table raw.public.orders TO ROLE analyst",
            "GRANT select ON view raw.public.orders_v TO ROLE analyst",
        ]
    );
}

#[tokio::test]
async fn test_ownership_keeps_last_claim() {
    let yaml = r#"
databases:
  - raw
roles:
  - first:
      owns:
        databases: [raw]
  - second:
      owns:
        databases: [raw]
"#;
    let account = admin_snapshot()
        .database("raw")
        .role("first", "securityadmin")
        .role("second", "securityadmin");
    let commands = plan(yaml, account, RunOptions::default()).await.unwrap();
    assert_eq!(
        sql(&commands),
        vec!["GRANT OWNERSHIP ON database raw TO ROLE second COPY CURRENT GRANTS"]
    );
}

// ============ Validation Tests ============

#[tokio::test]
async fn test_wrong_role_is_permission_error() {
    let connector = SnapshotConnector::new(membership_account().current_role("sysadmin"));
    let err = load(MEMBERSHIP_SPEC, &connector, &LoadOptions::default())
        .await
        .unwrap_err();
    match err {
        PermissionsError::Permission { expected, actual } => {
            assert_eq!(expected, "securityadmin");
            assert_eq!(actual, "sysadmin");
        }
        other => panic!("Expected permission error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_require_owner_with_empty_spec() {
    let commands = plan("require-owner: true\n", admin_snapshot(), RunOptions::default())
        .await
        .unwrap();
    assert!(commands.is_empty());
}

#[tokio::test]
async fn test_require_owner_reports_unowned_entities() {
    let yaml = r#"
require-owner: true
roles:
  - owned:
      owner: securityadmin
  - unowned:
      member_of: [owned]
"#;
    let err = plan(yaml, admin_snapshot(), RunOptions::default())
        .await
        .unwrap_err();
    match err {
        PermissionsError::Configuration(errors) => {
            assert_eq!(errors, vec!["Spec Error: Owner not defined for role unowned."]);
        }
        other => panic!("Expected configuration error, got {:?}", other),
    }
}

const PRUNE_SPEC: &str = r#"
roles:
  - primary:
      member_of: [testrole, gone]
  - testrole:
  - gone:
      member_of: [testrole]
"#;

#[tokio::test]
async fn test_missing_role_fails_without_ignore() {
    let connector = SnapshotConnector::new(
        admin_snapshot()
            .role("primary", "securityadmin")
            .role("testrole", "securityadmin"),
    );
    let err = load(PRUNE_SPEC, &connector, &LoadOptions::default())
        .await
        .unwrap_err();
    match &err {
        PermissionsError::Validation(errors) => assert_eq!(errors.len(), 1),
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert!(err
        .to_string()
        .contains("Role gone was not found on the server"));
}

#[tokio::test]
async fn test_missing_role_is_pruned_everywhere() {
    let connector = SnapshotConnector::new(
        admin_snapshot()
            .role("primary", "securityadmin")
            .role("testrole", "securityadmin"),
    );
    let options = LoadOptions::default().ignore_missing_entities(true);
    let loader = load(PRUNE_SPEC, &connector, &options).await.unwrap();

    assert!(loader.spec().role("gone").is_none());
    assert!(!loader.catalog().roles.contains("gone"));

    let commands = loader
        .generate_permission_queries(&connector, &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(sql(&commands), vec!["GRANT ROLE testrole TO role primary"]);
}

#[tokio::test]
async fn test_owner_mismatch_is_not_pruned() {
    let yaml = r#"
roles:
  - loader:
      owner: sysadmin
"#;
    let connector = SnapshotConnector::new(admin_snapshot().role("loader", "securityadmin"));
    let options = LoadOptions::default().ignore_missing_entities(true);
    let err = load(yaml, &connector, &options).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Role loader has owner securityadmin on the server, but has owner sysadmin defined in the spec file."
    );
}

// ============ Connector Usage Tests ============

#[tokio::test]
async fn test_empty_spec_only_checks_role() {
    let connector = SnapshotConnector::new(admin_snapshot());
    let loader = load("version: \"1.0\"\n", &connector, &LoadOptions::default())
        .await
        .unwrap();
    loader
        .generate_permission_queries(&connector, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(connector.count("SHOW"), 0);
    assert_eq!(
        connector.issued(),
        vec!["SELECT CURRENT_USER()", "SELECT CURRENT_ROLE()"]
    );
}

#[tokio::test]
async fn test_role_filter_limits_grant_fetch() {
    let connector = SnapshotConnector::new(membership_account());
    let options = LoadOptions::default().run(RunOptions::default().roles(["primary"]));
    load(MEMBERSHIP_SPEC, &connector, &options).await.unwrap();

    assert_eq!(connector.count("SHOW GRANTS TO ROLE"), 1);
    assert_eq!(connector.count("SHOW GRANTS TO ROLE primary"), 1);
}

#[tokio::test]
async fn test_skip_grant_fetch() {
    let connector = SnapshotConnector::new(membership_account());
    let options = LoadOptions::default().skip_grant_fetch(true);
    let loader = load(MEMBERSHIP_SPEC, &connector, &options).await.unwrap();

    assert_eq!(connector.count("SHOW GRANTS"), 0);
    assert!(loader.grants().roles_granted_to_user("testusername").is_empty());
}

// ============ File Tests ============

#[tokio::test]
async fn test_load_from_files() {
    let mut spec_file = NamedTempFile::new().unwrap();
    spec_file.write_all(MEMBERSHIP_SPEC.as_bytes()).unwrap();

    let mut state_file = NamedTempFile::new().unwrap();
    let snapshot = serde_json::to_string(&membership_account()).unwrap();
    state_file.write_all(snapshot.as_bytes()).unwrap();

    let connector = SnapshotConnector::from_path(state_file.path()).unwrap();
    let loader = SpecLoader::from_path(spec_file.path(), &connector, &LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(loader.spec().roles.len(), 2);
}

#[tokio::test]
async fn test_missing_spec_file_is_spec_error() {
    let dir = tempfile::tempdir().unwrap();
    let connector = SnapshotConnector::new(admin_snapshot());
    let err = SpecLoader::from_path(
        dir.path().join("missing.yml"),
        &connector,
        &LoadOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PermissionsError::Spec(_)));
}
