//! Error types for the database client

use termin_common::StoreError;
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored value could not be decoded into its domain type
    #[error("Invalid stored value in column {column}: {message}")]
    DecodeError { column: String, message: String },
}

impl DbError {
    pub(crate) fn decode(column: &str, message: impl ToString) -> Self {
        DbError::DecodeError {
            column: column.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DecodeError { .. } => StoreError::Corrupt(err.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
