//! Send OTP action

use tracing::{error, info};

use crate::domains::auth::errors::SignupError;
use crate::domains::auth::notify::{dispatch_otp, format_recipient};
use crate::domains::auth::otp::generate_otp;
use crate::kernel::ServerDeps;

/// Generate an OTP for `phone_number`, store it, and send it by SMS.
///
/// The SMS goes out on a tracked background task; the caller gets `Ok` as
/// soon as the code is stored, whatever happens to delivery.
pub async fn send_otp(deps: &ServerDeps, phone_number: &str, name: &str) -> Result<(), SignupError> {
    if phone_number.trim().is_empty() {
        return Err(SignupError::Validation("Phone number is required"));
    }
    if name.trim().is_empty() {
        return Err(SignupError::Validation("Name is required for OTP generation"));
    }

    let otp = generate_otp();

    deps.otp_store
        .put(phone_number, name, &otp)
        .await
        .map_err(|e| {
            error!(phone_number, error = %e, "Failed to store OTP");
            SignupError::Otp(e)
        })?;

    let sms = deps.sms.clone();
    let recipient = format_recipient(&deps.settings.sms_country_code, phone_number);
    let policy = deps.settings.sms_retry.clone();
    deps.background.spawn(async move {
        if let Err(e) = dispatch_otp(sms.as_ref(), &recipient, &otp, &policy).await {
            error!(recipient = %recipient, error = %e, "Giving up on OTP delivery");
        }
    });

    info!(phone_number, "OTP issued");
    Ok(())
}
