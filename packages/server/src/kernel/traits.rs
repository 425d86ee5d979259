// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (OTP checks, token issuance) lives in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseUserStore, BaseSmsService)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::common::StoreError;
use crate::domains::auth::models::AuthToken;
use crate::domains::auth::PendingOtp;
use crate::domains::creatives::Creative;
use crate::domains::users::User;

// =============================================================================
// User Store Trait (Infrastructure - durable user records)
// =============================================================================

#[async_trait]
pub trait BaseUserStore: Send + Sync {
    /// Look up a user by phone number. `None` when not registered.
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user. Fails with `StoreError::Conflict` when the phone
    /// number is already taken.
    async fn insert(&self, name: &str, phone_number: &str) -> Result<User, StoreError>;

    /// Readiness probe
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// Token Store Trait (Infrastructure - hashed bearer tokens)
// =============================================================================

#[async_trait]
pub trait BaseTokenStore: Send + Sync {
    async fn insert(&self, token: &AuthToken) -> Result<(), StoreError>;

    /// Owner of the token with this hash and scope whose expiry is after `now`.
    /// `StoreError::NotFound` when nothing matches.
    async fn find_user_for_token(
        &self,
        token_hash: &[u8],
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError>;

    async fn delete_all_for_user(&self, user_id: i64, scope: &str) -> Result<u64, StoreError>;
}

// =============================================================================
// OTP Cache Trait (Infrastructure - expiring key/value records)
// =============================================================================

#[async_trait]
pub trait BaseOtpCache: Send + Sync {
    /// Replace the record for `phone_number` and reset its TTL.
    async fn put(
        &self,
        phone_number: &str,
        pending: &PendingOtp,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn get(&self, phone_number: &str) -> Result<Option<PendingOtp>, StoreError>;

    /// Delete the record only if it still holds `otp`. Returns whether a
    /// record was deleted.
    async fn consume(&self, phone_number: &str, otp: &str) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// SMS Trait (Infrastructure - outbound text messages)
// =============================================================================

#[async_trait]
pub trait BaseSmsService: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

// =============================================================================
// Creative Store Trait (Infrastructure - scheduled uploads)
// =============================================================================

#[async_trait]
pub trait BaseCreativeStore: Send + Sync {
    async fn insert(
        &self,
        user_id: i64,
        creative_url: &str,
        scheduled_at: NaiveDate,
    ) -> Result<Creative, StoreError>;

    async fn find_scheduled_on(&self, dates: &[NaiveDate]) -> Result<Vec<Creative>, StoreError>;
}
