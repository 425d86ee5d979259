use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domains::auth::actions::{send_otp, verify_otp};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Serialize)]
pub struct OtpSentResponse {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
pub struct RegisteredResponse {
    success: bool,
    data: User,
    token: String,
    message: &'static str,
}

/// `POST /signup`
///
/// Without an OTP: issue and text a code. With an OTP: verify it, create the
/// user on first success, and return a bearer token.
pub async fn signup_handler(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| {
        debug!(error = %e, "Rejected signup body");
        ApiError::validation("Invalid request payload")
    })?;

    match request.otp.as_deref().filter(|otp| !otp.is_empty()) {
        None => {
            send_otp(&state.deps, &request.phone_number, &request.name).await?;
            Ok(Json(OtpSentResponse {
                success: true,
                message: "OTP sent successfully",
            })
            .into_response())
        }
        Some(otp) => {
            let verified = verify_otp(&state.deps, &request.phone_number, otp).await?;
            Ok(Json(RegisteredResponse {
                success: true,
                data: verified.user,
                token: verified.token,
                message: "User registered successfully",
            })
            .into_response())
        }
    }
}
