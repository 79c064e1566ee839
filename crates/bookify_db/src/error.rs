//! Error types for the database layer.

use thiserror::Error;

/// Errors produced by the Bookify stores.
#[derive(Error, Debug)]
pub enum DbError {
    /// Database configuration is missing or unusable
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// The database URL could not be parsed
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// The connection pool could not be created
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// A query failed
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let message = err.to_string();
        if message.contains("UNIQUE constraint failed") || message.contains("duplicate key") {
            DbError::Conflict(message)
        } else {
            DbError::QueryError(message)
        }
    }
}
