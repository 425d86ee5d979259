//! OTP delivery over SMS with bounded retries.

use std::time::Duration;

use tracing::{info, warn};

use crate::domains::auth::errors::DispatchError;
use crate::kernel::BaseSmsService;

/// Fixed-delay retry schedule for SMS sends.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

pub fn otp_message(otp: &str) -> String {
    format!("Thank you for choosing Cheershare! Your one-time password is {otp}.")
}

/// Prefix a locally-formatted number with the deployment's country code.
/// Numbers already in E.164 form are left alone.
pub fn format_recipient(country_code: &str, phone_number: &str) -> String {
    if phone_number.starts_with('+') {
        phone_number.to_string()
    } else {
        format!("{country_code}{phone_number}")
    }
}

/// Send the OTP, retrying up to `policy.max_attempts` times.
pub async fn dispatch_otp(
    sms: &dyn BaseSmsService,
    recipient: &str,
    otp: &str,
    policy: &RetryPolicy,
) -> Result<(), DispatchError> {
    let body = otp_message(otp);
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match sms.send_sms(recipient, &body).await {
            Ok(()) => {
                info!(recipient, attempt, "OTP sent");
                return Ok(());
            }
            Err(e) => {
                warn!(recipient, attempt, error = %e, "Failed to send OTP");
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(DispatchError::Exhausted {
        attempts,
        last_error,
    })
}
