//! Storage error mapping into the core error taxonomy.

use daystack_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// SQLite-layer failures. Converted into `daystack_core::Error` at the
/// repository boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Connection(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Connection(message) => Error::Database(DatabaseError::Connection(message)),
            StorageError::Query(inner) => Error::Database(DatabaseError::Query(inner.to_string())),
            StorageError::Migration(message) => Error::Database(DatabaseError::Migration(message)),
            StorageError::Internal(message) => Error::Database(DatabaseError::Internal(message)),
        }
    }
}
