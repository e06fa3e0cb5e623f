//! Identity resolution and role gating.
//!
//! Handlers ask for [`CurrentUser`] or [`AdminUser`]; both run the same
//! verify -> resolve chain, and every auth failure along it becomes the same
//! 401 so callers cannot tell a bad signature from a deleted account.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use crate::{
    auth::{
        jwt::{Claims, TokenError},
        roles::Role,
    },
    error::{AppError, AppResult},
    state::AppState,
    store::{StoreError, User, UserRepo},
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Token(_) | AuthError::UserNotFound => AppError::Unauthorized,
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Loads the token subject. A user deleted after issuance resolves to
/// `UserNotFound`, which is how tokens get revoked.
pub async fn resolve(users: &dyn UserRepo, claims: &Claims) -> Result<User, AuthError> {
    users
        .find_one(&claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)
}

async fn authenticate(state: &AppState, token: &str) -> Result<User, AuthError> {
    let claims = state.keys.verify(token)?;
    resolve(state.users.as_ref(), &claims).await
}

pub async fn require_authenticated(state: &AppState, token: &str) -> AppResult<User> {
    authenticate(state, token).await.map_err(|e| {
        debug!(reason = %e, "authentication failed");
        AppError::from(e)
    })
}

pub async fn require_admin(state: &AppState, token: &str) -> AppResult<User> {
    let user = require_authenticated(state, token).await?;
    match user.role {
        Role::Admin => Ok(user),
        Role::User => {
            warn!(user_id = %user.id, "admin route denied");
            Err(AppError::Forbidden)
        }
    }
}

/// Token from `Authorization: Bearer <token>`; scheme is case-insensitive.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Any authenticated caller.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        require_authenticated(state, token).await.map(CurrentUser)
    }
}

/// Authenticated caller with the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        require_admin(state, token).await.map(AdminUser)
    }
}
