use thiserror::Error;

use crate::common::StoreError;

/// Outcomes of authenticating a request that stop it from reaching a handler.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Header present but not `Bearer <26-char token>`.
    #[error("Invalid authorization header")]
    MalformedHeader,

    /// Well-formed token that matches no live row. Wrong and expired tokens
    /// share this variant.
    #[error("Invalid authorization header")]
    InvalidToken,

    #[error("Can't find user for specified token")]
    Lookup(#[source] StoreError),

    #[error("Authentication layer not installed")]
    MissingIdentity,
}

impl AuthError {
    /// Bad credential (401) versus system failure (500).
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            AuthError::AuthenticationRequired | AuthError::MalformedHeader | AuthError::InvalidToken
        )
    }
}
