//! Connector error types

use thiserror::Error;

/// Errors surfaced by a warehouse connector
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Queried object is absent or not visible to the current role
    #[error("Object does not exist: {0}")]
    ObjectDoesNotExist(String),

    /// Query was rejected by the server
    #[error("Query failed: {0}")]
    Query(String),

    /// Standard IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Account snapshot could not be decoded
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;
