use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::StoreError;

/// Bearer token as issued.
///
/// Only `hash` is ever persisted; `plaintext` exists in memory long enough to
/// be returned to the client once.
#[derive(Clone)]
pub struct AuthToken {
    pub plaintext: String,
    pub hash: Vec<u8>,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: String,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl AuthToken {
    /// Persist the hashed form of the token
    pub async fn insert(&self, pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&self.hash)
        .bind(self.user_id)
        .bind(self.expiry)
        .bind(&self.scope)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete every token a user holds in `scope`
    pub async fn delete_all_for_user(
        user_id: i64,
        scope: &str,
        pool: &PgPool,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND scope = $2")
            .bind(user_id)
            .bind(scope)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
