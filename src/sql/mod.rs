//! Statement generation primitives
//!
//! Provides:
//! - The privilege model and access-level mapping
//! - Statement templates and the generated command type

pub mod command;
pub mod privileges;

pub use command::{quote_literal, Grantee, SqlCommand, Statement};
pub use privileges::{AccessLevel, ObjectKind, Privilege, PRIVILEGE_TABLE_VERSION};
