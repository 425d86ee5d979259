//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain actions.
//! All external services use trait abstractions to enable testing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use twilio::TwilioService;

use crate::config::Config;
use crate::domains::auth::notify::RetryPolicy;
use crate::domains::auth::OtpStore;
use crate::kernel::background::BackgroundTasks;
use crate::kernel::{BaseCreativeStore, BaseSmsService, BaseTokenStore, BaseUserStore};

// =============================================================================
// TwilioService Adapter (implements BaseSmsService trait)
// =============================================================================

/// Wrapper around TwilioService that implements BaseSmsService trait
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseSmsService for TwilioAdapter {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        self.0
            .send_message(to, body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Failed to send SMS: {}", e))
    }
}

// =============================================================================
// ServerSettings
// =============================================================================

/// Tunables the actions read at request time.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub token_ttl: chrono::Duration,
    pub sms_country_code: String,
    pub sms_retry: RetryPolicy,
    pub upload_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            token_ttl: chrono::Duration::hours(48),
            sms_country_code: "+91".to_string(),
            sms_retry: RetryPolicy::default(),
            upload_dir: PathBuf::from("./uploads"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for ServerSettings {
    fn from(config: &Config) -> Self {
        Self {
            token_ttl: config.token_ttl,
            sms_country_code: config.sms_country_code.clone(),
            sms_retry: RetryPolicy::default(),
            upload_dir: config.upload_dir.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub users: Arc<dyn BaseUserStore>,
    pub tokens: Arc<dyn BaseTokenStore>,
    pub otp_store: OtpStore,
    pub sms: Arc<dyn BaseSmsService>,
    pub creatives: Arc<dyn BaseCreativeStore>,
    /// SMS sends that must finish before the process exits
    pub background: BackgroundTasks,
    pub settings: ServerSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        users: Arc<dyn BaseUserStore>,
        tokens: Arc<dyn BaseTokenStore>,
        otp_store: OtpStore,
        sms: Arc<dyn BaseSmsService>,
        creatives: Arc<dyn BaseCreativeStore>,
        settings: ServerSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            otp_store,
            sms,
            creatives,
            background: BackgroundTasks::new(),
            settings,
        }
    }
}
