//! Authentication extractors.
//!
//! Protected handlers take [`RequireUser`], which resolves the bearer token to
//! the caller's [`Identity`] before the handler body runs. The login handler
//! takes [`BasicCredentials`].

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::db::Store;
use crate::error::{AppError, set_sentry_user};
use crate::models::Identity;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 `Token is missing!` when no `Authorization` header is sent
/// and `Token is invalid!` for any other scheme, a forged or expired token, or
/// a token whose account has been deleted.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(identity): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser(pub Identity);

impl<S: Store> FromRequestParts<AppState<S>> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let identity = AuthService::new(state.store(), state.tokens())
            .authenticate(token)
            .await
            .inspect_err(|e| tracing::debug!(error = %e, "Bearer token rejected"))?;

        set_sentry_user(&identity.user_id, &identity.username);
        tracing::Span::current().record("user_id", identity.user_id.to_string());

        Ok(Self(identity))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::Missing)?;
    let value = value.to_str().map_err(|_| AuthError::Invalid)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::Invalid),
    }
}

/// Username and password from an `Authorization: Basic` header.
///
/// Any missing or malformed header rejects with 401 `Could not verify!`.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BasicCredentials {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(basic_credentials(&parts.headers)?)
    }
}

fn basic_credentials(headers: &HeaderMap) -> Result<BasicCredentials, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidCredentials)?;

    let encoded = match value.split_once(' ') {
        Some((scheme, encoded)) if scheme.eq_ignore_ascii_case("basic") => encoded.trim(),
        _ => return Err(AuthError::InvalidCredentials),
    };

    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(AuthError::InvalidCredentials)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::InvalidCredentials)?;
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(BasicCredentials {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}
