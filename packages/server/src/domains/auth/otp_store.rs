use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domains::auth::errors::OtpError;
use crate::domains::auth::otp::OTP_TTL;
use crate::kernel::BaseOtpCache;

/// Pending signup waiting for its code, keyed by phone number.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOtp {
    pub name: String,
    pub otp: String,
}

impl std::fmt::Debug for PendingOtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOtp")
            .field("name", &self.name)
            .field("otp", &"****")
            .finish()
    }
}

/// Short-lived OTP storage on top of a cache backend.
#[derive(Clone)]
pub struct OtpStore {
    cache: Arc<dyn BaseOtpCache>,
}

impl OtpStore {
    pub fn new(cache: Arc<dyn BaseOtpCache>) -> Self {
        Self { cache }
    }

    /// Store (or replace) the pending record and restart its 5-minute clock.
    pub async fn put(&self, phone_number: &str, name: &str, otp: &str) -> Result<(), OtpError> {
        let pending = PendingOtp {
            name: name.to_string(),
            otp: otp.to_string(),
        };
        self.cache
            .put(phone_number, &pending, OTP_TTL)
            .await
            .map_err(OtpError::Storage)
    }

    /// Check `supplied_otp` and return the display name captured at signup.
    ///
    /// A matching record is consumed, so each code verifies at most once.
    /// Cache failures are reported as `ExpiredOrMissing`.
    pub async fn verify(&self, phone_number: &str, supplied_otp: &str) -> Result<String, OtpError> {
        let pending = match self.cache.get(phone_number).await {
            Ok(Some(pending)) => pending,
            Ok(None) => return Err(OtpError::ExpiredOrMissing),
            Err(e) => {
                warn!(phone_number, error = %e, "OTP lookup failed");
                return Err(OtpError::ExpiredOrMissing);
            }
        };

        if pending.otp != supplied_otp {
            return Err(OtpError::Mismatch);
        }

        // Compare-and-delete: a concurrent verification or a fresh signup may
        // have changed the record since we read it.
        match self.cache.consume(phone_number, &pending.otp).await {
            Ok(true) => Ok(pending.name),
            Ok(false) => Err(OtpError::ExpiredOrMissing),
            Err(e) => {
                warn!(phone_number, error = %e, "OTP consume failed");
                Err(OtpError::ExpiredOrMissing)
            }
        }
    }

    pub async fn ping(&self) -> Result<(), crate::common::StoreError> {
        self.cache.ping().await
    }
}
