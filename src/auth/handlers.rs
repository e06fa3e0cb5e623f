use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterRequest, TokenResponse},
        guard::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        roles::Role,
    },
    error::{AppError, AppResult},
    extract::{AppForm, AppJson},
    state::AppState,
    store::NewUser,
};

const BAD_CREDENTIALS: &str = "Incorrect email or password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<PublicUser>> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim().to_string();

    if name.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password must not be empty"));
    }
    let role = match payload.role.as_deref() {
        None => Role::default(),
        Some(r) => r.parse::<Role>().map_err(|e| AppError::validation(e.to_string()))?,
    };

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Duplicate("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, %role, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    AppForm(form): AppForm<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let email = normalize_email(&form.username);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::validation(BAD_CREDENTIALS));
    };

    if !verify_password(&form.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::validation(BAD_CREDENTIALS));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.issue_access(&user.id, user.role)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(access_token)))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no-at.com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ann@X.Com "), "ann@x.com");
    }
}
