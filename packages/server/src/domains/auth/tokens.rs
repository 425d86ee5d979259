//! Opaque bearer tokens: 16 random bytes, base-32 for the client, SHA-256 for
//! storage.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::domains::auth::errors::TokenError;
use crate::domains::auth::models::AuthToken;
use crate::domains::users::User;
use crate::kernel::BaseTokenStore;

pub const SCOPE_AUTHENTICATION: &str = "authentication";

const TOKEN_BYTES: usize = 16;

/// Length of a plaintext token: 128 bits in unpadded base-32.
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// RFC 4648 base-32 without padding.
fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}

/// SHA-256 of the plaintext, the only form that reaches storage.
pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Build a fresh token for `user_id` expiring `ttl` after `now`.
pub fn generate_token(user_id: i64, ttl: Duration, scope: &str, now: DateTime<Utc>) -> AuthToken {
    let mut random = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut random);

    let plaintext = encode_base32(&random);
    let hash = hash_token(&plaintext);

    AuthToken {
        plaintext,
        hash,
        user_id,
        expiry: now + ttl,
        scope: scope.to_string(),
    }
}

/// Issue and persist a token, returning the plaintext.
///
/// The plaintext is dropped if persistence fails.
pub async fn issue_token(
    tokens: &dyn BaseTokenStore,
    user_id: i64,
    ttl: Duration,
    scope: &str,
) -> Result<String, TokenError> {
    let token = generate_token(user_id, ttl, scope, Utc::now());

    if let Err(e) = tokens.insert(&token).await {
        error!(user_id, scope, error = %e, "Failed to persist token");
        return Err(TokenError::Storage(e));
    }

    debug!(user_id, scope, expiry = %token.expiry, "Issued token");
    Ok(token.plaintext)
}

/// Resolve a plaintext token to its owner.
pub async fn verify_token(
    tokens: &dyn BaseTokenStore,
    scope: &str,
    plaintext: &str,
) -> Result<User, TokenError> {
    verify_token_at(tokens, scope, plaintext, Utc::now()).await
}

/// [`verify_token`] against an explicit clock.
pub async fn verify_token_at(
    tokens: &dyn BaseTokenStore,
    scope: &str,
    plaintext: &str,
    now: DateTime<Utc>,
) -> Result<User, TokenError> {
    let hash = hash_token(plaintext);
    tokens
        .find_user_for_token(&hash, scope, now)
        .await
        .map_err(TokenError::from)
}

/// Delete every `scope` token held by `user_id`. Returns the number removed.
pub async fn revoke_all_for_user(
    tokens: &dyn BaseTokenStore,
    user_id: i64,
    scope: &str,
) -> Result<u64, TokenError> {
    tokens
        .delete_all_for_user(user_id, scope)
        .await
        .map_err(TokenError::Storage)
}
