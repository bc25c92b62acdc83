//! Role statements
//!
//! Emitted in order: memberships, ownership, warehouse and integration
//! privileges, then database, schema and table privileges. Each privilege
//! family is followed by revocations of grants the role holds on managed
//! objects but no longer lists.

use std::slice;

use crate::spec::{AccessLists, Owns, RoleConfig};
use crate::sql::privileges::{privileges_for, shared_database_privileges, write_only};
use crate::sql::{AccessLevel, Grantee, ObjectKind, Privilege, SqlCommand, Statement};

use super::{resolve_members, CommandGenerator, GenerationContext};

const INFORMATION_SCHEMA: &str = "information_schema";

/// Generator for `roles` entries
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleCommands;

impl CommandGenerator for RoleCommands {
    type Config = RoleConfig;

    fn generate_commands(
        &self,
        role: &str,
        config: &RoleConfig,
        ctx: &GenerationContext<'_>,
    ) -> Vec<SqlCommand> {
        let mut commands = Vec::new();
        if !ctx.ignore_memberships {
            memberships(role, config, ctx, &mut commands);
        }
        ownership(role, &config.owns, ctx, &mut commands);
        elemental_privileges(role, ObjectKind::Warehouse, &config.warehouses, ctx, &mut commands);
        elemental_privileges(
            role,
            ObjectKind::Integration,
            &config.integrations,
            ctx,
            &mut commands,
        );
        database_privileges(role, &config.privileges.databases, ctx, &mut commands);
        schema_privileges(role, &config.privileges.schemas, ctx, &mut commands);
        table_privileges(role, &config.privileges.tables, ctx, &mut commands);
        commands
    }
}

fn memberships(
    role: &str,
    config: &RoleConfig,
    ctx: &GenerationContext<'_>,
    commands: &mut Vec<SqlCommand>,
) {
    let members = resolve_members(&config.member_of, ctx.all_roles, Some(role));
    for member in &members {
        let statement = Statement::GrantRole {
            role: member,
            grantee: Grantee::Role,
            name: role,
        };
        let granted = ctx.grants.is_granted(role, "usage", "role", member);
        commands.push(SqlCommand::from_statement(&statement, granted));
    }

    for granted in ctx.grants.granted(role, "usage", "role") {
        if members.contains(granted) {
            continue;
        }
        let statement = Statement::RevokeRole {
            role: granted,
            grantee: Grantee::Role,
            name: role,
        };
        commands.push(SqlCommand::from_statement(&statement, false));
    }
}

fn is_information_schema(schema: &str) -> bool {
    schema
        .rsplit('.')
        .next()
        .is_some_and(|s| s.eq_ignore_ascii_case(INFORMATION_SCHEMA))
}

/// Schemas an ownership rule covers; `db.*` skips `information_schema`
fn owned_schemas(schema: &str, ctx: &GenerationContext<'_>) -> Vec<String> {
    let mut schemas = ctx.inventory.expand_schema(schema);
    if schema.ends_with(".*") {
        schemas.retain(|s| !is_information_schema(s));
    }
    schemas
}

fn ownership(role: &str, owns: &Owns, ctx: &GenerationContext<'_>, commands: &mut Vec<SqlCommand>) {
    let mut transfer = |kind: ObjectKind, name: &str| {
        let granted = ctx.grants.is_granted(role, "ownership", kind.to_str(), name);
        let statement = Statement::GrantOwnership { kind, name, role };
        commands.push(SqlCommand::from_statement(&statement, granted));
    };

    for database in &owns.databases {
        transfer(ObjectKind::Database, database);
    }

    for schema in &owns.schemas {
        for name in owned_schemas(schema, ctx) {
            transfer(ObjectKind::Schema, &name);
        }
    }

    for table in &owns.tables {
        let Some((schema, name)) = table.rsplit_once('.') else {
            continue;
        };
        for schema in owned_schemas(schema, ctx) {
            if name == "*" {
                for table in ctx.inventory.tables_in(&schema) {
                    transfer(ObjectKind::Table, &table);
                }
            } else {
                transfer(ObjectKind::Table, &format!("{}.{}", schema, name));
            }
        }
    }
}

/// Warehouse and integration privileges, one statement per privilege
fn elemental_privileges(
    role: &str,
    kind: ObjectKind,
    names: &[String],
    ctx: &GenerationContext<'_>,
    commands: &mut Vec<SqlCommand>,
) {
    let privileges = privileges_for(kind, AccessLevel::Read);

    for name in names {
        for privilege in privileges {
            let granted = ctx
                .grants
                .is_granted(role, privilege.to_str(), kind.to_str(), name);
            let statement = Statement::Grant {
                privileges: slice::from_ref(privilege),
                kind,
                name,
                role,
            };
            commands.push(SqlCommand::from_statement(&statement, granted));
        }
    }

    for privilege in privileges {
        for granted in ctx.grants.granted(role, privilege.to_str(), kind.to_str()) {
            if names.contains(granted) {
                continue;
            }
            let statement = Statement::Revoke {
                privileges: slice::from_ref(privilege),
                kind,
                name: granted,
                role,
            };
            commands.push(SqlCommand::from_statement(&statement, false));
        }
    }
}

/// Names granted `privileges` on `kind` objects, de-duplicated, in fetch order
fn granted_any(
    role: &str,
    privileges: &[Privilege],
    kind: ObjectKind,
    ctx: &GenerationContext<'_>,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for privilege in privileges {
        for name in ctx.grants.granted(role, privilege.to_str(), kind.to_str()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    names
}

fn database_privileges(
    role: &str,
    lists: &AccessLists,
    ctx: &GenerationContext<'_>,
    commands: &mut Vec<SqlCommand>,
) {
    for (level, databases) in [(AccessLevel::Read, &lists.read), (AccessLevel::Write, &lists.write)] {
        for database in databases {
            // imported privileges show up as usage on the shared database
            let (privileges, granted) = if ctx.is_shared(database) {
                (
                    shared_database_privileges(),
                    ctx.grants.is_granted(role, "usage", "database", database),
                )
            } else {
                let privileges = privileges_for(ObjectKind::Database, level);
                (privileges, ctx.holds_all(role, privileges, "database", database))
            };
            let statement = Statement::Grant {
                privileges,
                kind: ObjectKind::Database,
                name: database,
                role,
            };
            commands.push(SqlCommand::from_statement(&statement, granted));
        }
    }

    let listed: Vec<&String> = lists.all().collect();
    let read_privileges = [Privilege::Usage, Privilege::ImportedPrivileges];
    for database in granted_any(role, &read_privileges, ObjectKind::Database, ctx) {
        if listed.contains(&&database) || !ctx.catalog.databases.contains(&database) {
            continue;
        }
        let privileges = if ctx.is_shared(&database) {
            shared_database_privileges()
        } else {
            &read_privileges[..1]
        };
        let statement = Statement::Revoke {
            privileges,
            kind: ObjectKind::Database,
            name: &database,
            role,
        };
        commands.push(SqlCommand::from_statement(&statement, false));
    }

    let write_privileges = write_only(ObjectKind::Database);
    for database in granted_any(role, &write_privileges, ObjectKind::Database, ctx) {
        if lists.write.contains(&database) || !ctx.manages(&database) {
            continue;
        }
        let statement = Statement::Revoke {
            privileges: &write_privileges,
            kind: ObjectKind::Database,
            name: &database,
            role,
        };
        commands.push(SqlCommand::from_statement(&statement, false));
    }
}

/// Revocation for a stale schema, table or view grant, if one is due
///
/// Grants outside managed databases are left alone, as are objects covered
/// by a future grant the role keeps on their container.
fn revoke_stale(
    role: &str,
    kind: ObjectKind,
    granted: &str,
    kept: &[String],
    privileges: &[Privilege],
    ctx: &GenerationContext<'_>,
) -> Option<SqlCommand> {
    if kept.iter().any(|k| k == granted) {
        return None;
    }
    let database = granted.split('.').next()?;
    if !ctx.manages(database) {
        return None;
    }

    let marker_suffix = format!(".<{}>", kind);
    if let Some(container) = granted.strip_suffix(marker_suffix.as_str()) {
        let container_kind = if container.contains('.') {
            ObjectKind::Schema
        } else {
            ObjectKind::Database
        };
        let statement = Statement::RevokeFuture {
            privileges,
            kind,
            container_kind,
            container,
            role,
        };
        return Some(SqlCommand::from_statement(&statement, false));
    }

    if let Some((container, _)) = granted.rsplit_once('.') {
        if kept.contains(&kind.future_marker(container)) {
            return None;
        }
    }

    let statement = Statement::Revoke {
        privileges,
        kind,
        name: granted,
        role,
    };
    Some(SqlCommand::from_statement(&statement, false))
}

/// Future grant on every `kind` object created in `container`
fn future_grant(
    role: &str,
    privileges: &[Privilege],
    kind: ObjectKind,
    container_kind: ObjectKind,
    container: &str,
    ctx: &GenerationContext<'_>,
) -> (SqlCommand, String) {
    let marker = kind.future_marker(container);
    let granted = ctx.holds_all(role, privileges, kind.to_str(), &marker);
    let statement = Statement::GrantFuture {
        privileges,
        kind,
        container_kind,
        container,
        role,
    };
    (SqlCommand::from_statement(&statement, granted), marker)
}

fn object_grant(
    role: &str,
    privileges: &[Privilege],
    kind: ObjectKind,
    name: &str,
    ctx: &GenerationContext<'_>,
) -> SqlCommand {
    let granted = ctx.holds_all(role, privileges, kind.to_str(), name);
    let statement = Statement::Grant {
        privileges,
        kind,
        name,
        role,
    };
    SqlCommand::from_statement(&statement, granted)
}

fn schema_privileges(
    role: &str,
    lists: &AccessLists,
    ctx: &GenerationContext<'_>,
    commands: &mut Vec<SqlCommand>,
) {
    let mut read_kept = Vec::new();
    let mut write_kept = Vec::new();

    for (level, schemas) in [(AccessLevel::Read, &lists.read), (AccessLevel::Write, &lists.write)] {
        let privileges = privileges_for(ObjectKind::Schema, level);
        let kept = match level {
            AccessLevel::Read => &mut read_kept,
            AccessLevel::Write => &mut write_kept,
        };

        for schema in schemas {
            let Some((database, name)) = schema.split_once('.') else {
                continue;
            };
            if ctx.is_shared(database) {
                continue;
            }
            if name == "*" {
                let (command, marker) = future_grant(
                    role,
                    privileges,
                    ObjectKind::Schema,
                    ObjectKind::Database,
                    database,
                    ctx,
                );
                commands.push(command);
                kept.push(marker);
            }
            for target in ctx.inventory.expand_schema(schema) {
                commands.push(object_grant(role, privileges, ObjectKind::Schema, &target, ctx));
                kept.push(target);
            }
        }
    }

    let all_kept: Vec<String> = read_kept.iter().chain(&write_kept).cloned().collect();
    let usage = [Privilege::Usage];
    for granted in ctx.grants.granted(role, "usage", "schema") {
        commands.extend(revoke_stale(role, ObjectKind::Schema, granted, &all_kept, &usage, ctx));
    }

    let write_privileges = write_only(ObjectKind::Schema);
    for granted in granted_any(role, &write_privileges, ObjectKind::Schema, ctx) {
        commands.extend(revoke_stale(
            role,
            ObjectKind::Schema,
            &granted,
            &write_kept,
            &write_privileges,
            ctx,
        ));
    }
}

/// Tables and views kept by a role's table rules
#[derive(Default)]
struct KeptObjects {
    tables: Vec<String>,
    views: Vec<String>,
}

impl KeptObjects {
    fn of(&mut self, kind: ObjectKind) -> &mut Vec<String> {
        match kind {
            ObjectKind::View => &mut self.views,
            _ => &mut self.tables,
        }
    }
}

fn table_privileges(
    role: &str,
    lists: &AccessLists,
    ctx: &GenerationContext<'_>,
    commands: &mut Vec<SqlCommand>,
) {
    let mut read_kept = KeptObjects::default();
    let mut write_kept = KeptObjects::default();

    for (level, tables) in [(AccessLevel::Read, &lists.read), (AccessLevel::Write, &lists.write)] {
        let kept = match level {
            AccessLevel::Read => &mut read_kept,
            AccessLevel::Write => &mut write_kept,
        };
        let by_kind = [
            (ObjectKind::Table, privileges_for(ObjectKind::Table, level)),
            (ObjectKind::View, privileges_for(ObjectKind::View, level)),
        ];

        for table in tables {
            let parts: Vec<&str> = table.split('.').collect();
            let [database, schema, name] = parts.as_slice() else {
                continue;
            };
            if ctx.is_shared(database) {
                continue;
            }
            // database-level future grants stay while any table rule names the database
            kept.tables.push(ObjectKind::Table.future_marker(database));
            kept.views.push(ObjectKind::View.future_marker(database));

            let schemas = if *schema == "*" {
                ctx.inventory.schemas_in(database)
            } else {
                vec![format!("{}.{}", database, schema)]
            };

            if *schema == "*" && *name == "*" {
                for (kind, privileges) in by_kind {
                    let (command, marker) =
                        future_grant(role, privileges, kind, ObjectKind::Database, database, ctx);
                    commands.push(command);
                    kept.of(kind).push(marker);
                }
            }

            for schema in &schemas {
                let (tables, views) = if *name == "*" {
                    for (kind, privileges) in by_kind {
                        let (command, marker) =
                            future_grant(role, privileges, kind, ObjectKind::Schema, schema, ctx);
                        commands.push(command);
                        kept.of(kind).push(marker);
                    }
                    (ctx.inventory.tables_in(schema), ctx.inventory.views_in(schema))
                } else {
                    let full = format!("{}.{}", schema, name);
                    let tables = ctx.inventory.tables_in(schema);
                    let views = ctx.inventory.views_in(schema);
                    let only = |listed: Vec<String>| -> Vec<String> {
                        listed.into_iter().filter(|n| *n == full).collect()
                    };
                    (only(tables), only(views))
                };

                for (kind, names) in [(ObjectKind::Table, tables), (ObjectKind::View, views)] {
                    let privileges = privileges_for(kind, level);
                    for name in names {
                        commands.push(object_grant(role, privileges, kind, &name, ctx));
                        kept.of(kind).push(name);
                    }
                }
            }
        }
    }

    let select = [Privilege::Select];
    for kind in [ObjectKind::Table, ObjectKind::View] {
        let all_kept: Vec<String> = read_kept
            .of(kind)
            .iter()
            .chain(write_kept.of(kind).iter())
            .cloned()
            .collect();
        for granted in ctx.grants.granted(role, "select", kind.to_str()) {
            commands.extend(revoke_stale(role, kind, granted, &all_kept, &select, ctx));
        }
    }

    let write_privileges = write_only(ObjectKind::Table);
    for granted in granted_any(role, &write_privileges, ObjectKind::Table, ctx) {
        commands.extend(revoke_stale(
            role,
            ObjectKind::Table,
            &granted,
            &write_kept.tables,
            &write_privileges,
            ctx,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityCatalog;
    use crate::grants::{GrantState, GrantStateBuilder, ObjectInventory};
    use crate::spec::MemberOf;

    struct Fixture {
        catalog: EntityCatalog,
        grants: GrantState,
        inventory: ObjectInventory,
        all_roles: Vec<String>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut catalog = EntityCatalog::new();
            for db in ["database_1", "raw", "shared_db"] {
                catalog.databases.insert(db.to_string());
                catalog.database_refs.insert(db.to_string());
            }
            catalog.shared_databases.insert("shared_db".to_string());

            let mut inventory = ObjectInventory::new();
            inventory.schemas.insert(
                "raw".into(),
                vec!["raw.public".into(), "raw.information_schema".into()],
            );
            inventory.tables.insert(
                "raw.public".into(),
                vec!["raw.public.orders".into(), "raw.public.users".into()],
            );
            inventory
                .views
                .insert("raw.public".into(), vec!["raw.public.orders_v".into()]);

            Fixture {
                catalog,
                grants: GrantState::default(),
                inventory,
                all_roles: vec!["test_role".into(), "other".into()],
            }
        }

        fn with_grants(mut self, grants: &[(&str, &str, &str)]) -> Self {
            let mut builder = GrantStateBuilder::new();
            for (privilege, kind, name) in grants {
                builder.record("test_role", privilege, kind, name);
            }
            self.grants = builder.build();
            self
        }

        fn run(&self, config: &RoleConfig) -> Vec<String> {
            self.commands(config).into_iter().map(|c| c.sql).collect()
        }

        fn commands(&self, config: &RoleConfig) -> Vec<SqlCommand> {
            let ctx = GenerationContext {
                catalog: &self.catalog,
                grants: &self.grants,
                inventory: &self.inventory,
                all_roles: &self.all_roles,
                ignore_memberships: false,
            };
            RoleCommands.generate_commands("test_role", config, &ctx)
        }
    }

    fn role(yaml: &str) -> RoleConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_shared_database_granted_through_usage() {
        let fixture = Fixture::new().with_grants(&[("usage", "database", "shared_db")]);
        let commands =
            fixture.commands(&role("privileges: { databases: { read: [shared_db] } }"));
        assert_eq!(
            commands,
            vec![SqlCommand::new(
                "GRANT imported privileges ON database shared_db TO ROLE test_role",
                true
            )]
        );
    }

    #[test]
    fn test_database_read_and_write() {
        let sql = Fixture::new().run(&role(
            "privileges: { databases: { read: [raw], write: [database_1, shared_db] } }",
        ));
        assert_eq!(
            sql,
            vec![
                "GRANT usage ON database raw TO ROLE test_role",
                "GRANT usage, monitor, create schema ON database database_1 TO ROLE test_role",
                "GRANT imported privileges ON database shared_db TO ROLE test_role",
            ]
        );
    }

    #[test]
    fn test_database_already_granted_needs_every_privilege() {
        let fixture = Fixture::new().with_grants(&[
            ("usage", "database", "database_1"),
            ("monitor", "database", "database_1"),
            ("usage", "database", "raw"),
        ]);
        let commands = fixture.commands(&role(
            "privileges: { databases: { read: [raw], write: [database_1] } }",
        ));
        assert!(commands[0].already_granted);
        assert!(!commands[1].already_granted);
    }

    #[test]
    fn test_database_revokes() {
        let fixture = Fixture::new().with_grants(&[
            ("usage", "database", "raw"),
            ("usage", "database", "unmanaged"),
            ("monitor", "database", "database_1"),
            ("create schema", "database", "database_1"),
            ("usage", "database", "database_1"),
        ]);
        let sql = fixture.run(&role("privileges: { databases: { read: [database_1] } }"));
        assert_eq!(
            sql,
            vec![
                "GRANT usage ON database database_1 TO ROLE test_role",
                "REVOKE usage ON database raw FROM ROLE test_role",
                "REVOKE monitor, create schema ON database database_1 FROM ROLE test_role",
            ]
        );
    }

    #[test]
    fn test_warehouse_privileges_are_elemental() {
        let fixture = Fixture::new().with_grants(&[
            ("usage", "warehouse", "loading"),
            ("usage", "warehouse", "old"),
        ]);
        let commands = fixture.commands(&role("warehouses: [loading]\nintegrations: [s3]"));
        let sql: Vec<&str> = commands.iter().map(|c| c.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "GRANT usage ON warehouse loading TO ROLE test_role",
                "GRANT operate ON warehouse loading TO ROLE test_role",
                "GRANT monitor ON warehouse loading TO ROLE test_role",
                "REVOKE usage ON warehouse old FROM ROLE test_role",
                "GRANT usage ON integration s3 TO ROLE test_role",
            ]
        );
        assert!(commands[0].already_granted);
        assert!(!commands[1].already_granted);
    }

    #[test]
    fn test_memberships_and_revokes() {
        let fixture = Fixture::new().with_grants(&[("usage", "role", "stale")]);
        let config = RoleConfig {
            member_of: MemberOf::Filter {
                include: vec!["*".into()],
                exclude: Vec::new(),
            },
            ..Default::default()
        };
        assert_eq!(
            fixture.run(&config),
            vec![
                "GRANT ROLE other TO role test_role",
                "REVOKE ROLE stale FROM role test_role",
            ]
        );
    }

    #[test]
    fn test_ownership_expands_wildcards() {
        let sql = Fixture::new().run(&role(
            "owns: { databases: [raw], schemas: [raw.*], tables: [raw.public.*] }",
        ));
        assert_eq!(
            sql,
            vec![
                "GRANT OWNERSHIP ON database raw TO ROLE test_role COPY CURRENT GRANTS",
                "GRANT OWNERSHIP ON schema raw.public TO ROLE test_role COPY CURRENT GRANTS",
                "GRANT OWNERSHIP ON table raw.public.orders TO ROLE test_role COPY CURRENT GRANTS",
                "GRANT OWNERSHIP ON table raw.public.users TO ROLE test_role COPY CURRENT GRANTS",
            ]
        );
    }

    #[test]
    fn test_schema_wildcard_adds_future_grant() {
        let sql = Fixture::new().run(&role("privileges: { schemas: { write: [raw.*] } }"));
        assert_eq!(sql.len(), 3);
        assert_eq!(
            sql[0],
            "GRANT usage, monitor, create table, create view, create stage, create file format, \
             create sequence, create function, create pipe ON FUTURE schemas IN database raw \
             TO ROLE test_role"
        );
        assert!(sql[1].ends_with("ON schema raw.public TO ROLE test_role"));
        assert!(sql[2].ends_with("ON schema raw.information_schema TO ROLE test_role"));
    }

    #[test]
    fn test_schema_revokes_respect_future_markers() {
        let fixture = Fixture::new().with_grants(&[
            ("usage", "schema", "raw.<schema>"),
            ("usage", "schema", "raw.old"),
            ("usage", "schema", "database_1.kept_by_future"),
            ("usage", "schema", "database_1.<schema>"),
            ("usage", "schema", "shared_db.s"),
        ]);
        let sql = fixture.run(&role("privileges: { schemas: { read: [database_1.*] } }"));
        assert_eq!(
            sql,
            vec![
                "GRANT usage ON FUTURE schemas IN database database_1 TO ROLE test_role",
                "REVOKE usage ON FUTURE schemas IN database raw FROM ROLE test_role",
                "REVOKE usage ON schema raw.old FROM ROLE test_role",
            ]
        );
    }

    #[test]
    fn test_single_table_and_view() {
        let sql = Fixture::new().run(&role(
            "privileges: { tables: { read: [raw.public.orders_v], write: [raw.public.orders, raw.public.missing] } }",
        ));
        assert_eq!(
            sql,
            vec![
                "GRANT select ON view raw.public.orders_v TO ROLE test_role",
                "GRANT select, insert, update, delete, truncate, references ON table raw.public.orders TO ROLE test_role",
            ]
        );
    }

    #[test]
    fn test_schema_table_wildcard() {
        let sql = Fixture::new().run(&role("privileges: { tables: { read: [raw.public.*] } }"));
        assert_eq!(
            sql,
            vec![
                "GRANT select ON FUTURE tables IN schema raw.public TO ROLE test_role",
                "GRANT select ON FUTURE views IN schema raw.public TO ROLE test_role",
                "GRANT select ON table raw.public.orders TO ROLE test_role",
                "GRANT select ON table raw.public.users TO ROLE test_role",
                "GRANT select ON view raw.public.orders_v TO ROLE test_role",
            ]
        );
    }

    #[test]
    fn test_database_table_wildcard() {
        let sql = Fixture::new().run(&role("privileges: { tables: { read: [raw.*.*] } }"));
        assert_eq!(
            &sql[..2],
            [
                "GRANT select ON FUTURE tables IN database raw TO ROLE test_role",
                "GRANT select ON FUTURE views IN database raw TO ROLE test_role",
            ]
        );
        assert!(sql.contains(&"GRANT select ON FUTURE tables IN schema raw.public TO ROLE test_role".to_string()));
        assert!(sql.contains(&"GRANT select ON table raw.public.users TO ROLE test_role".to_string()));
    }

    #[test]
    fn test_table_revokes() {
        let fixture = Fixture::new().with_grants(&[
            ("select", "table", "raw.public.orders"),
            ("select", "table", "raw.public.users"),
            ("insert", "table", "raw.public.orders"),
            ("select", "table", "raw.public.<table>"),
            ("select", "table", "raw.<table>"),
            ("select", "view", "raw.<view>"),
            ("select", "view", "raw.public.orders_v"),
            ("select", "table", "unmanaged.public.t"),
        ]);
        let commands =
            fixture.commands(&role("privileges: { tables: { read: [raw.public.orders] } }"));
        let sql: Vec<&str> = commands.iter().map(|c| c.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "GRANT select ON table raw.public.orders TO ROLE test_role",
                "REVOKE select ON table raw.public.users FROM ROLE test_role",
                "REVOKE select ON FUTURE tables IN schema raw.public FROM ROLE test_role",
                "REVOKE select ON view raw.public.orders_v FROM ROLE test_role",
                "REVOKE insert, update, delete, truncate, references ON table raw.public.orders FROM ROLE test_role",
            ]
        );
        assert!(commands[0].already_granted);
    }
}
