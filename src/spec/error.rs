//! Spec loading errors

use thiserror::Error;

/// Errors raised while reading or decoding a spec document
#[derive(Error, Debug)]
pub enum SpecError {
    /// Spec file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Top-level key is not a known section
    #[error("Unknown spec section '{0}'")]
    UnknownSection(String),

    /// Document structure does not match the expected layout
    #[error("Invalid spec structure: {0}")]
    Shape(String),

    /// Entity config block failed to decode
    #[error("Invalid config for {section} entry '{name}': {source}")]
    Entity {
        section: &'static str,
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type for spec loading
pub type SpecResult<T> = Result<T, SpecError>;
