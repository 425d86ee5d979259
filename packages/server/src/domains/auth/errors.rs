use thiserror::Error;

use crate::common::StoreError;

/// OTP verification failures.
///
/// `ExpiredOrMissing` and `Mismatch` render identically so a caller cannot
/// tell a wrong code from an expired one.
#[derive(Error, Debug)]
pub enum OtpError {
    #[error("invalid or expired OTP")]
    ExpiredOrMissing,

    #[error("invalid or expired OTP")]
    Mismatch,

    #[error("failed to store OTP: {0}")]
    Storage(#[source] StoreError),
}

#[derive(Error, Debug)]
pub enum TokenError {
    /// Wrong, expired and out-of-scope tokens all land here.
    #[error("token not found")]
    NotFound,

    #[error("token storage failed: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => TokenError::NotFound,
            other => TokenError::Storage(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("all {attempts} attempts to send OTP failed, last error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Everything that can stop a signup or verification request.
#[derive(Error, Debug)]
pub enum SignupError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Otp(OtpError),

    #[error("failed to register user: {0}")]
    Registration(#[source] StoreError),

    #[error("failed to generate authentication token: {0}")]
    Token(#[source] TokenError),
}
