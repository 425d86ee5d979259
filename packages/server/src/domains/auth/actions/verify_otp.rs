//! Verify OTP action

use tracing::{error, info};

use crate::domains::auth::errors::SignupError;
use crate::domains::auth::tokens::{issue_token, SCOPE_AUTHENTICATION};
use crate::domains::users::{get_or_create, User};
use crate::kernel::ServerDeps;

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct VerifiedSignup {
    pub user: User,
    /// Plaintext bearer token, shown to the client exactly once.
    pub token: String,
}

/// Verify the OTP for `phone_number`, provision the user on first success,
/// and issue an authentication token.
pub async fn verify_otp(
    deps: &ServerDeps,
    phone_number: &str,
    code: &str,
) -> Result<VerifiedSignup, SignupError> {
    if phone_number.trim().is_empty() {
        return Err(SignupError::Validation("Phone number is required"));
    }

    let name = deps
        .otp_store
        .verify(phone_number, code)
        .await
        .map_err(|e| {
            info!(phone_number, error = %e, "OTP verification failed");
            SignupError::Otp(e)
        })?;

    let user = get_or_create(deps.users.as_ref(), phone_number, &name)
        .await
        .map_err(|e| {
            error!(phone_number, error = %e, "Failed to register user");
            SignupError::Registration(e)
        })?;

    let token = issue_token(
        deps.tokens.as_ref(),
        user.id,
        deps.settings.token_ttl,
        SCOPE_AUTHENTICATION,
    )
    .await
    .map_err(|e| {
        error!(user_id = user.id, error = %e, "Failed to generate token");
        SignupError::Token(e)
    })?;

    info!(user_id = user.id, "OTP verified");
    Ok(VerifiedSignup { user, token })
}
