use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::{dto::PublicUser, guard::AdminUser},
    error::{AppError, AppResult},
    extract::AppQuery,
    state::AppState,
    store::{effective_limit, UserFilter},
};

const NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

impl From<UserQuery> for UserFilter {
    fn from(q: UserQuery) -> Self {
        UserFilter {
            name_contains: q.q.filter(|s| !s.is_empty()),
            limit: effective_limit(q.limit),
        }
    }
}

/// Admin-only. Users are created through `/auth/register` and never edited.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppQuery(query): AppQuery<UserQuery>,
) -> AppResult<Json<Vec<PublicUser>>> {
    let users = state.users.find_many(&query.into()).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<PublicUser>> {
    state
        .users
        .find_one(&id)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

/// Outstanding tokens of the deleted user stop resolving immediately.
#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    if !state.users.delete_by_id(&id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(user_id = %id, admin_id = %admin.id, "user deleted");
    Ok(Json(json!({ "success": true })))
}
