use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{validate, ProductQuery};
use crate::{
    auth::guard::AdminUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppQuery},
    state::AppState,
    store::{Product, ProductInput},
};

const NOT_FOUND: &str = "Product not found";

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let products = state.products.find_many(&query.into()).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    state
        .products
        .find_one(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

#[instrument(skip(state, admin, input))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(input): AppJson<ProductInput>,
) -> AppResult<Json<Product>> {
    validate(&input)?;
    let product = state.products.create(input).await?;
    info!(product_id = %product.id, admin_id = %admin.id, "product created");
    Ok(Json(product))
}

/// Replaces every writable field; omitted optionals are cleared.
#[instrument(skip(state, admin, input))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    AppJson(input): AppJson<ProductInput>,
) -> AppResult<Json<Product>> {
    validate(&input)?;
    let product = state
        .products
        .update_by_id(&id, input)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(product_id = %product.id, admin_id = %admin.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state, admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    if !state.products.delete_by_id(&id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(product_id = %id, admin_id = %admin.id, "product deleted");
    Ok(Json(json!({ "success": true })))
}
