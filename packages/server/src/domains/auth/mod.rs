//! Auth domain - phone-number OTP signup and opaque bearer tokens
//!
//! Flow:
//!   POST /signup without otp -> generate -> OtpStore::put -> SMS (background)
//!   POST /signup with otp    -> OtpStore::verify -> get_or_create user -> issue token
//!
//! Responsibilities:
//! - One-time password generation and short-lived storage
//! - SMS delivery with bounded retries
//! - Token issuance, verification and revocation (hash-only persistence)

pub mod actions;
pub mod errors;
pub mod models;
pub mod notify;
pub mod otp;
pub mod otp_store;
pub mod tokens;

pub use errors::{DispatchError, OtpError, SignupError, TokenError};
pub use models::AuthToken;
pub use otp::{generate_otp, OTP_TTL};
pub use otp_store::{OtpStore, PendingOtp};
pub use tokens::{
    hash_token, issue_token, revoke_all_for_user, verify_token, verify_token_at,
    SCOPE_AUTHENTICATION, TOKEN_PLAINTEXT_LEN,
};
