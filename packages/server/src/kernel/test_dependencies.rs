// TestDependencies - in-memory stores and mock services for testing
//
// Provides implementations of the Base* traits that can be injected into
// ServerDeps, so actions and routes run without Postgres, Redis or Twilio.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::time::Instant;

use super::{
    BaseCreativeStore, BaseOtpCache, BaseSmsService, BaseTokenStore, BaseUserStore, ServerDeps,
    ServerSettings,
};
use crate::common::StoreError;
use crate::domains::auth::models::AuthToken;
use crate::domains::auth::notify::RetryPolicy;
use crate::domains::auth::{OtpStore, PendingOtp};
use crate::domains::creatives::Creative;
use crate::domains::users::User;

fn injected_failure(what: &str) -> StoreError {
    StoreError::Other(anyhow::anyhow!("injected {what} failure"))
}

// =============================================================================
// In-memory User Store
// =============================================================================

pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    hide_next_lookup: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            hide_next_lookup: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next phone-number lookup miss, as if another request inserted
    /// the row just after we looked.
    pub fn hide_next_lookup(&self) {
        self.hide_next_lookup.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseUserStore for InMemoryUserStore {
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.phone_number == phone_number)
            .cloned())
    }

    async fn insert(&self, name: &str, phone_number: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.phone_number == phone_number) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: users.len() as i64 + 1,
            created_at: Utc::now(),
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            version: 1,
        };
        users.push(user.clone());
        Ok(user)
    }
}

// =============================================================================
// In-memory Token Store
// =============================================================================

pub struct InMemoryTokenStore {
    users: Arc<InMemoryUserStore>,
    tokens: Mutex<Vec<AuthToken>>,
    fail_writes: AtomicBool,
    lookups: AtomicUsize,
}

impl InMemoryTokenStore {
    pub fn new(users: Arc<InMemoryUserStore>) -> Self {
        Self {
            users,
            tokens: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hashes currently persisted, in insertion order.
    pub fn stored_hashes(&self) -> Vec<Vec<u8>> {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.hash.clone())
            .collect()
    }

    /// Number of token lookups performed so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseTokenStore for InMemoryTokenStore {
    async fn insert(&self, token: &AuthToken) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure("token write"));
        }
        // Only the hash is kept, like the real table.
        let mut stored = token.clone();
        stored.plaintext.clear();
        self.tokens.lock().unwrap().push(stored);
        Ok(())
    }

    async fn find_user_for_token(
        &self,
        token_hash: &[u8],
        scope: &str,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let user_id = self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.hash == token_hash && t.scope == scope && t.expiry > now)
            .map(|t| t.user_id)
            .ok_or(StoreError::NotFound)?;
        self.users.get(user_id).ok_or(StoreError::NotFound)
    }

    async fn delete_all_for_user(&self, user_id: i64, scope: &str) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| !(t.user_id == user_id && t.scope == scope));
        Ok((before - tokens.len()) as u64)
    }
}

// =============================================================================
// In-memory OTP Cache
// =============================================================================

struct CachedOtp {
    pending: PendingOtp,
    expires_at: Instant,
}

pub struct InMemoryOtpCache {
    entries: Mutex<HashMap<String, CachedOtp>>,
    last_ttl: Mutex<Option<Duration>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryOtpCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            last_ttl: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Drop every record as if its TTL had elapsed.
    pub fn expire_all(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// TTL passed to the most recent `put`.
    pub fn last_ttl(&self) -> Option<Duration> {
        *self.last_ttl.lock().unwrap()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Live record for `phone_number`, bypassing failure injection.
    pub fn peek(&self, phone_number: &str) -> Option<PendingOtp> {
        self.entries
            .lock()
            .unwrap()
            .get(phone_number)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.pending.clone())
    }
}

impl Default for InMemoryOtpCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOtpCache for InMemoryOtpCache {
    async fn put(
        &self,
        phone_number: &str,
        pending: &PendingOtp,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure("cache write"));
        }
        self.entries.lock().unwrap().insert(
            phone_number.to_string(),
            CachedOtp {
                pending: pending.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        *self.last_ttl.lock().unwrap() = Some(ttl);
        Ok(())
    }

    async fn get(&self, phone_number: &str) -> Result<Option<PendingOtp>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure("cache read"));
        }
        Ok(self.peek(phone_number))
    }

    async fn consume(&self, phone_number: &str, otp: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let matches = entries
            .get(phone_number)
            .is_some_and(|e| e.expires_at > Instant::now() && e.pending.otp == otp);
        if matches {
            entries.remove(phone_number);
        }
        Ok(matches)
    }
}

// =============================================================================
// Mock SMS Service
// =============================================================================

pub struct MockSmsService {
    sent: Mutex<Vec<(String, String)>>,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    /// Fail the first `n` sends
    pub fn failing_times(self, n: u32) -> Self {
        self.set_failures(n);
        self
    }

    pub fn set_failures(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Successfully delivered `(to, body)` pairs
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for MockSmsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSmsService for MockSmsService {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            anyhow::bail!("mock SMS gateway unavailable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// =============================================================================
// In-memory Creative Store
// =============================================================================

pub struct InMemoryCreativeStore {
    creatives: Mutex<Vec<Creative>>,
    stall_reads: AtomicBool,
    panic_on_read: AtomicBool,
}

impl InMemoryCreativeStore {
    pub fn new() -> Self {
        Self {
            creatives: Mutex::new(Vec::new()),
            stall_reads: AtomicBool::new(false),
            panic_on_read: AtomicBool::new(false),
        }
    }

    pub fn all(&self) -> Vec<Creative> {
        self.creatives.lock().unwrap().clone()
    }

    /// Make `find_scheduled_on` hang forever, like a wedged connection
    pub fn stall_reads(&self) {
        self.stall_reads.store(true, Ordering::SeqCst);
    }

    /// Make `find_scheduled_on` panic
    pub fn panic_on_read(&self) {
        self.panic_on_read.store(true, Ordering::SeqCst);
    }
}

impl Default for InMemoryCreativeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCreativeStore for InMemoryCreativeStore {
    async fn insert(
        &self,
        user_id: i64,
        creative_url: &str,
        scheduled_at: NaiveDate,
    ) -> Result<Creative, StoreError> {
        let mut creatives = self.creatives.lock().unwrap();
        let creative = Creative {
            id: creatives.len() as i64 + 1,
            user_id,
            creative_url: creative_url.to_string(),
            scheduled_at,
            created_at: Utc::now(),
        };
        creatives.push(creative.clone());
        Ok(creative)
    }

    async fn find_scheduled_on(&self, dates: &[NaiveDate]) -> Result<Vec<Creative>, StoreError> {
        if self.panic_on_read.load(Ordering::SeqCst) {
            panic!("creative store blew up");
        }
        if self.stall_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self
            .creatives
            .lock()
            .unwrap()
            .iter()
            .filter(|c| dates.contains(&c.scheduled_at))
            .cloned()
            .collect())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub users: Arc<InMemoryUserStore>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub otp_cache: Arc<InMemoryOtpCache>,
    pub sms: Arc<MockSmsService>,
    pub creatives: Arc<InMemoryCreativeStore>,
    pub upload_dir: PathBuf,
}

impl TestDependencies {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let upload_dir =
            std::env::temp_dir().join(format!("cheershare-test-{}", uuid::Uuid::new_v4()));
        Self {
            tokens: Arc::new(InMemoryTokenStore::new(users.clone())),
            users,
            otp_cache: Arc::new(InMemoryOtpCache::new()),
            sms: Arc::new(MockSmsService::new()),
            creatives: Arc::new(InMemoryCreativeStore::new()),
            upload_dir,
        }
    }

    /// Build ServerDeps over the in-memory stores. SMS retries do not sleep.
    pub fn server_deps(&self) -> ServerDeps {
        let _ = std::fs::create_dir_all(&self.upload_dir);
        let settings = ServerSettings {
            sms_retry: RetryPolicy {
                max_attempts: 3,
                delay: Duration::ZERO,
            },
            upload_dir: self.upload_dir.clone(),
            ..ServerSettings::default()
        };
        ServerDeps::new(
            self.users.clone(),
            self.tokens.clone(),
            OtpStore::new(self.otp_cache.clone()),
            self.sms.clone(),
            self.creatives.clone(),
            settings,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
