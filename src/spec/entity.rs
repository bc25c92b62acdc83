//! Typed config records for each entity kind

use serde::{Deserialize, Deserializer};

/// A single `{name: config}` entry of a spec section
///
/// `config` is `None` for name-only declarations (null or empty mapping).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<C> {
    pub name: String,
    pub config: Option<C>,
}

impl<C> Entity<C> {
    pub fn new(name: impl Into<String>, config: Option<C>) -> Self {
        Entity {
            name: name.into(),
            config,
        }
    }

    /// Owner declared for this entity, if any
    pub fn owner(&self) -> Option<&str>
    where
        C: HasOwner,
    {
        self.config.as_ref().and_then(HasOwner::owner)
    }
}

/// Config records that may declare an owning role
pub trait HasOwner {
    fn owner(&self) -> Option<&str>;
}

macro_rules! impl_has_owner {
    ($($ty:ty),*) => {
        $(impl HasOwner for $ty {
            fn owner(&self) -> Option<&str> {
                self.owner.as_deref()
            }
        })*
    };
}

impl_has_owner!(
    DatabaseConfig,
    WarehouseConfig,
    IntegrationConfig,
    RoleConfig,
    UserConfig
);

/// Database declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database is shared from another account (granted via imported privileges)
    #[serde(deserialize_with = "loose_bool")]
    pub shared: bool,
    pub owner: Option<String>,
}

/// Warehouse declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarehouseConfig {
    pub size: Option<String>,
    pub owner: Option<String>,
}

/// Integration declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationConfig {
    pub category: Option<String>,
    pub owner: Option<String>,
}

/// Role memberships: either a plain list or an include/exclude pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MemberOf {
    List(Vec<String>),
    Filter {
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl Default for MemberOf {
    fn default() -> Self {
        MemberOf::List(Vec::new())
    }
}

impl MemberOf {
    /// Every role name mentioned, included or excluded
    pub fn mentioned(&self) -> Vec<&String> {
        match self {
            MemberOf::List(roles) => roles.iter().collect(),
            MemberOf::Filter { include, exclude } => include.iter().chain(exclude).collect(),
        }
    }

    /// Drop a role from every list
    pub fn forget(&mut self, role: &str) {
        match self {
            MemberOf::List(roles) => roles.retain(|r| r != role),
            MemberOf::Filter { include, exclude } => {
                include.retain(|r| r != role);
                exclude.retain(|r| r != role);
            }
        }
    }
}

/// Read and write target lists for one object kind
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessLists {
    pub read: Vec<String>,
    pub write: Vec<String>,
}

impl AccessLists {
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.read.iter().chain(self.write.iter())
    }

    fn forget(&mut self, name: &str) {
        self.read.retain(|n| n != name);
        self.write.retain(|n| n != name);
    }
}

/// Role `privileges` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Privileges {
    pub databases: AccessLists,
    pub schemas: AccessLists,
    pub tables: AccessLists,
}

/// Role `owns` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Owns {
    pub databases: Vec<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
}

/// Role declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleConfig {
    pub owner: Option<String>,
    pub warehouses: Vec<String>,
    pub integrations: Vec<String>,
    pub member_of: MemberOf,
    pub privileges: Privileges,
    pub owns: Owns,
}

impl RoleConfig {
    /// Remove references to a database and everything inside it
    pub fn forget_database(&mut self, database: &str) {
        let prefix = format!("{database}.");
        let outside = |name: &String| name != database && !name.starts_with(&prefix);
        for list in [
            &mut self.privileges.databases.read,
            &mut self.privileges.databases.write,
            &mut self.privileges.schemas.read,
            &mut self.privileges.schemas.write,
            &mut self.privileges.tables.read,
            &mut self.privileges.tables.write,
            &mut self.owns.databases,
            &mut self.owns.schemas,
            &mut self.owns.tables,
        ] {
            list.retain(|name| outside(name));
        }
    }

    pub fn forget_schema(&mut self, schema: &str) {
        self.privileges.schemas.forget(schema);
        self.owns.schemas.retain(|s| s != schema);
    }

    pub fn forget_table(&mut self, table: &str) {
        self.privileges.tables.forget(table);
        self.owns.tables.retain(|t| t != table);
    }
}

/// User declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    pub owner: Option<String>,
    #[serde(deserialize_with = "loose_opt_bool")]
    pub can_login: Option<bool>,
    /// Accepted for compatibility; password state is not managed
    #[serde(deserialize_with = "loose_opt_bool")]
    pub has_password: Option<bool>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub comment: Option<String>,
    pub default_warehouse: Option<String>,
    pub default_namespace: Option<String>,
    pub default_role: Option<String>,
    pub member_of: Vec<String>,
}

/// Boolean that also accepts yes/no/on/off strings
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Text(String),
}

impl LooseBool {
    fn resolve<E: serde::de::Error>(self) -> Result<bool, E> {
        match self {
            LooseBool::Bool(b) => Ok(b),
            LooseBool::Text(s) => parse_flag(&s)
                .ok_or_else(|| E::custom(format!("expected a boolean, found '{s}'"))),
        }
    }
}

/// Parse a textual flag (`true/yes/on/1`, `false/no/off/0`)
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "y" => Some(true),
        "false" | "no" | "off" | "0" | "n" => Some(false),
        _ => None,
    }
}

pub(crate) fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    LooseBool::deserialize(deserializer)?.resolve()
}

fn loose_opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<LooseBool>::deserialize(deserializer)? {
        Some(value) => value.resolve().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_of_forms() {
        let list: MemberOf = serde_yaml::from_str("[a, b]").unwrap();
        assert_eq!(list, MemberOf::List(vec!["a".into(), "b".into()]));

        let filter: MemberOf = serde_yaml::from_str("include: ['*']\nexclude: [b]").unwrap();
        assert_eq!(
            filter,
            MemberOf::Filter {
                include: vec!["*".into()],
                exclude: vec!["b".into()]
            }
        );
    }

    #[test]
    fn test_forget_database_strips_nested_refs() {
        let mut role: RoleConfig = serde_yaml::from_str(
            r#"
privileges:
  databases: { read: [raw, raw2] }
  schemas: { read: [raw.public, raw2.public] }
  tables: { write: [raw.public.t1] }
owns:
  schemas: [raw.*]
"#,
        )
        .unwrap();

        role.forget_database("raw");
        assert_eq!(role.privileges.databases.read, vec!["raw2"]);
        assert_eq!(role.privileges.schemas.read, vec!["raw2.public"]);
        assert!(role.privileges.tables.write.is_empty());
        assert!(role.owns.schemas.is_empty());
    }

    #[test]
    fn test_loose_booleans() {
        let user: UserConfig = serde_yaml::from_str("can_login: yes").unwrap();
        assert_eq!(user.can_login, Some(true));
        let user: UserConfig = serde_yaml::from_str("can_login: false").unwrap();
        assert_eq!(user.can_login, Some(false));
        assert!(serde_yaml::from_str::<UserConfig>("can_login: maybe").is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_yaml::from_str::<RoleConfig>("colour: blue").is_err());
    }
}
