use std::time::Duration;

use thiserror::Error;

/// Failure of a backing store (Postgres or Redis).
///
/// `NotFound` and `Conflict` are expected outcomes callers branch on; the rest
/// are infrastructure failures that end up as a generic 500.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated")]
    Conflict,

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("storage error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}
