//! Error types for chainscan

use thiserror::Error;

/// Failures surfaced by the storage layer.
///
/// Logical absence (a height or identifier that simply is not stored) is not
/// an error; lookups return `Ok(None)` or an empty list for that case.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement inside a unit of work failed; the whole unit rolls back.
    #[error("query error: {0}")]
    Query(String),

    /// Stored rows describe a structurally impossible value, e.g. a fee
    /// without its transition or a variant row without its sub-record.
    #[error("consistency error: {0}")]
    Consistency(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Query(format!("column codec: {}", err))
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, StoreError>;
