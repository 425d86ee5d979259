//! HTTP edge errors. Every failure leaves the server as
//! `{"success": false, "error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::common::AuthError;
use crate::domains::auth::{OtpError, SignupError};
use crate::domains::creatives::UploadError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// Public message only; the cause is logged where the error is built.
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Log `cause` and return a 500 carrying only `message`.
    pub fn internal(message: &str, cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "{message}");
        ApiError::Internal(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let body = ErrorBody {
            success: false,
            error: &message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<SignupError> for ApiError {
    fn from(err: SignupError) -> Self {
        match err {
            SignupError::Validation(message) => ApiError::validation(message),
            SignupError::Otp(OtpError::ExpiredOrMissing | OtpError::Mismatch) => {
                ApiError::Unauthorized("Invalid or expired OTP".to_string())
            }
            SignupError::Otp(e @ OtpError::Storage(_)) => ApiError::internal("Failed to store OTP", e),
            SignupError::Registration(e) => ApiError::internal("Failed to register user", e),
            SignupError::Token(e) => ApiError::internal("Failed to generate token", e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_credential_failure() {
            ApiError::Unauthorized(err.to_string())
        } else {
            ApiError::internal("Internal server error", err)
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            e @ UploadError::TooLarge => ApiError::PayloadTooLarge(e.to_string()),
            UploadError::Io(e) => ApiError::internal("Failed to save file", e),
            other => ApiError::validation(other.to_string()),
        }
    }
}
