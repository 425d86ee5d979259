use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::StoreError;

/// User model - SQL persistence layer
///
/// `phone_number` is the natural key and carries a unique constraint; that
/// constraint, not application code, decides concurrent signup races.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub phone_number: String,
    /// Optimistic-concurrency counter, 1 on insert.
    pub version: i32,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl User {
    /// Find user by phone number
    pub async fn find_by_phone_number(
        phone_number: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, created_at, name, phone_number, version
            FROM users
            WHERE phone_number = $1
            "#,
        )
        .bind(phone_number)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Insert a new user. Fails with `StoreError::Conflict` if the phone
    /// number is already registered.
    pub async fn insert(name: &str, phone_number: &str, pool: &PgPool) -> Result<Self, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, phone_number)
            VALUES ($1, $2)
            RETURNING id, created_at, name, phone_number, version
            "#,
        )
        .bind(name)
        .bind(phone_number)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Resolve the owner of a live token.
    ///
    /// Matches on hash, scope and an expiry strictly after `now`. Returns
    /// `StoreError::NotFound` when no row matches.
    pub async fn find_for_token(
        token_hash: &[u8],
        scope: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT users.id, users.created_at, users.name, users.phone_number, users.version
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1 AND tokens.scope = $2 AND tokens.expiry > $3
            "#,
        )
        .bind(token_hash)
        .bind(scope)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }
}
