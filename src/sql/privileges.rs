//! Warehouse privilege model
//!
//! Maps spec access levels onto concrete privileges per object kind:
//! - Database: `usage` to read; adds `monitor, create schema` to write
//! - Schema: `usage` to read; adds monitor and object creation to write
//! - Table: `select` to read; adds DML, `truncate` and `references` to write
//! - View: `select` for either level
//! - Warehouse / integration: a fixed set, each granted on its own
//!
//! The table is versioned; any change to the mapping bumps
//! [`PRIVILEGE_TABLE_VERSION`].

use std::fmt;

/// Version of the access-level mapping below
pub const PRIVILEGE_TABLE_VERSION: u32 = 1;

/// Privilege types managed by grantsmith
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    Usage,
    Operate,
    Monitor,
    CreateSchema,
    CreateTable,
    CreateView,
    CreateStage,
    CreateFileFormat,
    CreateSequence,
    CreateFunction,
    CreatePipe,
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    References,
    /// Access to a database shared from another account
    ImportedPrivileges,
    Ownership,
}

impl Privilege {
    /// Parse privilege name from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "usage" => Some(Privilege::Usage),
            "operate" => Some(Privilege::Operate),
            "monitor" => Some(Privilege::Monitor),
            "create schema" => Some(Privilege::CreateSchema),
            "create table" => Some(Privilege::CreateTable),
            "create view" => Some(Privilege::CreateView),
            "create stage" => Some(Privilege::CreateStage),
            "create file format" => Some(Privilege::CreateFileFormat),
            "create sequence" => Some(Privilege::CreateSequence),
            "create function" => Some(Privilege::CreateFunction),
            "create pipe" => Some(Privilege::CreatePipe),
            "select" => Some(Privilege::Select),
            "insert" => Some(Privilege::Insert),
            "update" => Some(Privilege::Update),
            "delete" => Some(Privilege::Delete),
            "truncate" => Some(Privilege::Truncate),
            "references" => Some(Privilege::References),
            "imported privileges" => Some(Privilege::ImportedPrivileges),
            "ownership" => Some(Privilege::Ownership),
            _ => None,
        }
    }

    /// Name as it appears in statements and in fetched grant maps
    pub fn to_str(&self) -> &'static str {
        match self {
            Privilege::Usage => "usage",
            Privilege::Operate => "operate",
            Privilege::Monitor => "monitor",
            Privilege::CreateSchema => "create schema",
            Privilege::CreateTable => "create table",
            Privilege::CreateView => "create view",
            Privilege::CreateStage => "create stage",
            Privilege::CreateFileFormat => "create file format",
            Privilege::CreateSequence => "create sequence",
            Privilege::CreateFunction => "create function",
            Privilege::CreatePipe => "create pipe",
            Privilege::Select => "select",
            Privilege::Insert => "insert",
            Privilege::Update => "update",
            Privilege::Delete => "delete",
            Privilege::Truncate => "truncate",
            Privilege::References => "references",
            Privilege::ImportedPrivileges => "imported privileges",
            Privilege::Ownership => "ownership",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Kinds of objects grants are placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Account,
    Database,
    Schema,
    Table,
    View,
    Warehouse,
    Integration,
    Role,
    User,
}

impl ObjectKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "account" => Some(ObjectKind::Account),
            "database" => Some(ObjectKind::Database),
            "schema" => Some(ObjectKind::Schema),
            "table" => Some(ObjectKind::Table),
            "view" => Some(ObjectKind::View),
            "warehouse" => Some(ObjectKind::Warehouse),
            "integration" => Some(ObjectKind::Integration),
            "role" => Some(ObjectKind::Role),
            "user" => Some(ObjectKind::User),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            ObjectKind::Account => "account",
            ObjectKind::Database => "database",
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Warehouse => "warehouse",
            ObjectKind::Integration => "integration",
            ObjectKind::Role => "role",
            ObjectKind::User => "user",
        }
    }

    /// Whether each privilege on this kind is granted in its own statement
    pub fn is_elemental(&self) -> bool {
        matches!(self, ObjectKind::Warehouse | ObjectKind::Integration)
    }

    /// Marker name future grants on `container` are recorded under,
    /// e.g. `raw.public.<table>`
    pub fn future_marker(&self, container: &str) -> String {
        format!("{}.<{}>", container, self.to_str())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Spec access levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    Read,
    Write,
}

const DATABASE_READ: &[Privilege] = &[Privilege::Usage];
const DATABASE_WRITE: &[Privilege] = &[
    Privilege::Usage,
    Privilege::Monitor,
    Privilege::CreateSchema,
];
const SCHEMA_READ: &[Privilege] = &[Privilege::Usage];
const SCHEMA_WRITE: &[Privilege] = &[
    Privilege::Usage,
    Privilege::Monitor,
    Privilege::CreateTable,
    Privilege::CreateView,
    Privilege::CreateStage,
    Privilege::CreateFileFormat,
    Privilege::CreateSequence,
    Privilege::CreateFunction,
    Privilege::CreatePipe,
];
const TABLE_READ: &[Privilege] = &[Privilege::Select];
const TABLE_WRITE: &[Privilege] = &[
    Privilege::Select,
    Privilege::Insert,
    Privilege::Update,
    Privilege::Delete,
    Privilege::Truncate,
    Privilege::References,
];
const VIEW_ACCESS: &[Privilege] = &[Privilege::Select];
const WAREHOUSE_ACCESS: &[Privilege] = &[Privilege::Usage, Privilege::Operate, Privilege::Monitor];
const INTEGRATION_ACCESS: &[Privilege] = &[Privilege::Usage];
const SHARED_DATABASE_ACCESS: &[Privilege] = &[Privilege::ImportedPrivileges];

/// Privileges an access level grants on `kind`, read privileges first
///
/// Warehouses and integrations have a single privilege set for either level.
pub fn privileges_for(kind: ObjectKind, level: AccessLevel) -> &'static [Privilege] {
    match (kind, level) {
        (ObjectKind::Database, AccessLevel::Read) => DATABASE_READ,
        (ObjectKind::Database, AccessLevel::Write) => DATABASE_WRITE,
        (ObjectKind::Schema, AccessLevel::Read) => SCHEMA_READ,
        (ObjectKind::Schema, AccessLevel::Write) => SCHEMA_WRITE,
        (ObjectKind::Table, AccessLevel::Read) => TABLE_READ,
        (ObjectKind::Table, AccessLevel::Write) => TABLE_WRITE,
        (ObjectKind::View, _) => VIEW_ACCESS,
        (ObjectKind::Warehouse, _) => WAREHOUSE_ACCESS,
        (ObjectKind::Integration, _) => INTEGRATION_ACCESS,
        _ => &[],
    }
}

/// Privileges write adds on top of read
pub fn write_only(kind: ObjectKind) -> Vec<Privilege> {
    let read = privileges_for(kind, AccessLevel::Read);
    privileges_for(kind, AccessLevel::Write)
        .iter()
        .filter(|p| !read.contains(p))
        .copied()
        .collect()
}

/// Privileges granted on a database shared from another account
pub fn shared_database_privileges() -> &'static [Privilege] {
    SHARED_DATABASE_ACCESS
}

/// Render a privilege list as `a, b, c`
pub fn join(privileges: &[Privilege]) -> String {
    privileges
        .iter()
        .map(Privilege::to_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for p in TABLE_WRITE.iter().chain(SCHEMA_WRITE).chain(WAREHOUSE_ACCESS) {
            assert_eq!(Privilege::parse(p.to_str()), Some(*p));
        }
        assert_eq!(Privilege::parse("CREATE SCHEMA"), Some(Privilege::CreateSchema));
        assert_eq!(Privilege::parse("drop"), None);
    }

    #[test]
    fn test_write_supersets_read() {
        for kind in [ObjectKind::Database, ObjectKind::Schema, ObjectKind::Table] {
            let read = privileges_for(kind, AccessLevel::Read);
            let write = privileges_for(kind, AccessLevel::Write);
            assert_eq!(&write[..read.len()], read);
        }
    }

    #[test]
    fn test_rendered_lists() {
        assert_eq!(
            join(privileges_for(ObjectKind::Database, AccessLevel::Write)),
            "usage, monitor, create schema"
        );
        assert_eq!(
            join(privileges_for(ObjectKind::Schema, AccessLevel::Write)),
            "usage, monitor, create table, create view, create stage, \
             create file format, create sequence, create function, create pipe"
        );
        assert_eq!(
            join(&write_only(ObjectKind::Table)),
            "insert, update, delete, truncate, references"
        );
        assert!(write_only(ObjectKind::View).is_empty());
    }

    #[test]
    fn test_future_marker() {
        assert_eq!(ObjectKind::Table.future_marker("raw.public"), "raw.public.<table>");
        assert_eq!(ObjectKind::Schema.future_marker("raw"), "raw.<schema>");
    }
}
