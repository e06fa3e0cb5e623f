use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{validate, DiscountQuery};
use crate::{
    auth::guard::AdminUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppQuery},
    state::AppState,
    store::{Discount, DiscountInput},
};

const NOT_FOUND: &str = "Discount not found";

pub fn discount_routes() -> Router<AppState> {
    Router::new()
        .route("/discounts", get(list_discounts).post(create_discount))
        .route(
            "/discounts/:id",
            get(get_discount).put(update_discount).delete(delete_discount),
        )
}

#[instrument(skip(state, _admin))]
pub async fn list_discounts(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppQuery(query): AppQuery<DiscountQuery>,
) -> AppResult<Json<Vec<Discount>>> {
    let discounts = state.discounts.find_many(&query.into()).await?;
    Ok(Json(discounts))
}

/// Public, so storefronts can render the discount a product points at.
#[instrument(skip(state))]
pub async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Discount>> {
    state
        .discounts
        .find_one(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

#[instrument(skip(state, admin, input))]
pub async fn create_discount(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(input): AppJson<DiscountInput>,
) -> AppResult<Json<Discount>> {
    validate(&input)?;
    let discount = state.discounts.create(input).await?;
    info!(discount_id = %discount.id, admin_id = %admin.id, "discount created");
    Ok(Json(discount))
}

#[instrument(skip(state, admin, input))]
pub async fn update_discount(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    AppJson(input): AppJson<DiscountInput>,
) -> AppResult<Json<Discount>> {
    validate(&input)?;
    let discount = state
        .discounts
        .update_by_id(&id, input)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(discount_id = %discount.id, admin_id = %admin.id, "discount updated");
    Ok(Json(discount))
}

#[instrument(skip(state, admin))]
pub async fn delete_discount(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    if !state.discounts.delete_by_id(&id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(discount_id = %id, admin_id = %admin.id, "discount deleted");
    Ok(Json(json!({ "success": true })))
}
