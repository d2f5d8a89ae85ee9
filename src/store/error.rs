//! Store error types.

use thiserror::Error;

/// A failure inside a timetable store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite rejected a statement.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A JSON column could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("store lock failed: {0}")]
    Lock(String),

    /// A stored row does not parse back into a record.
    #[error("malformed row in {table}: {message}")]
    Malformed { table: String, message: String },

    /// The backing store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn malformed(table: &str, message: impl Into<String>) -> Self {
        StoreError::Malformed {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
