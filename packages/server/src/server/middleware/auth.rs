use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, VARY},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::common::{AuthError, Identity};
use crate::domains::auth::{verify_token, TokenError, SCOPE_AUTHENTICATION, TOKEN_PLAINTEXT_LEN};
use crate::domains::users::User;
use crate::kernel::ServerDeps;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Bearer authentication middleware
///
/// Resolves the `Authorization` header to an [`Identity`] and stores it in
/// request extensions. A missing header means anonymous; a malformed or
/// unknown token ends the request with 401 before any handler runs.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut response = match resolve_identity(&state.deps, request.headers()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    };

    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Authorization"));
    response
}

/// Work out who is calling from the request headers.
pub async fn resolve_identity(deps: &ServerDeps, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(Identity::Anonymous);
    };

    let token = parse_bearer(header)?;

    match verify_token(deps.tokens.as_ref(), SCOPE_AUTHENTICATION, token).await {
        Ok(user) => {
            debug!(user_id = user.id, "Authenticated request");
            Ok(Identity::User(user))
        }
        Err(TokenError::NotFound) => Err(AuthError::InvalidToken),
        Err(TokenError::Storage(e)) => Err(AuthError::Lookup(e)),
    }
}

/// Extract the token from `Bearer <token>`.
///
/// Exactly two space-separated parts, the literal scheme `Bearer`, and a
/// token of the issued length. Checked before storage is touched.
pub fn parse_bearer(header: &HeaderValue) -> Result<&str, AuthError> {
    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if token.len() == TOKEN_PLAINTEXT_LEN => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

fn identity_from_parts(parts: &Parts) -> Result<Identity, AuthError> {
    parts
        .extensions
        .get::<Identity>()
        .cloned()
        .ok_or(AuthError::MissingIdentity)
}

/// Identity for routes that accept anonymous callers.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(identity_from_parts(parts)?)
    }
}

/// Extractor for routes that require a signed-in user. Anonymous callers get
/// 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)?
            .into_user()
            .map(AuthenticatedUser)
            .ok_or_else(|| ApiError::from(AuthError::AuthenticationRequired))
    }
}
