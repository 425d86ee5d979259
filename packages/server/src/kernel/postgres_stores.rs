//! Postgres-backed stores. Queries live on the models; these wrap them with a
//! per-call deadline.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::common::StoreError;
use crate::domains::auth::models::AuthToken;
use crate::domains::creatives::Creative;
use crate::domains::users::User;
use crate::kernel::{BaseCreativeStore, BaseTokenStore, BaseUserStore};

/// Deadline applied to every storage round-trip.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Run `fut` under [`STORE_TIMEOUT`].
pub async fn bounded<T, F>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    bounded_by(STORE_TIMEOUT, fut).await
}

pub async fn bounded_by<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseUserStore for PostgresUserStore {
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        bounded(User::find_by_phone_number(phone_number, &self.pool)).await
    }

    async fn insert(&self, name: &str, phone_number: &str) -> Result<User, StoreError> {
        bounded(User::insert(name, phone_number, &self.pool)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        bounded(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}

#[derive(Clone)]
pub struct PostgresTokenStore {
    pool: PgPool,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseTokenStore for PostgresTokenStore {
    async fn insert(&self, token: &AuthToken) -> Result<(), StoreError> {
        bounded(token.insert(&self.pool)).await
    }

    async fn find_user_for_token(
        &self,
        token_hash: &[u8],
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        bounded(User::find_for_token(token_hash, scope, now, &self.pool)).await
    }

    async fn delete_all_for_user(&self, user_id: i64, scope: &str) -> Result<u64, StoreError> {
        bounded(AuthToken::delete_all_for_user(user_id, scope, &self.pool)).await
    }
}

#[derive(Clone)]
pub struct PostgresCreativeStore {
    pool: PgPool,
}

impl PostgresCreativeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseCreativeStore for PostgresCreativeStore {
    async fn insert(
        &self,
        user_id: i64,
        creative_url: &str,
        scheduled_at: NaiveDate,
    ) -> Result<Creative, StoreError> {
        bounded(Creative::insert(user_id, creative_url, scheduled_at, &self.pool)).await
    }

    async fn find_scheduled_on(&self, dates: &[NaiveDate]) -> Result<Vec<Creative>, StoreError> {
        bounded(Creative::find_scheduled_on(dates, &self.pool)).await
    }
}
