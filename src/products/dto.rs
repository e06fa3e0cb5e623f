use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    store::{effective_limit, ProductFilter, ProductInput},
};

/// Query string accepted by `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<i64>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(q: ProductQuery) -> Self {
        ProductFilter {
            name_contains: q.q.filter(|s| !s.is_empty()),
            category: q.category.filter(|s| !s.is_empty()),
            min_price: q.min_price,
            max_price: q.max_price,
            limit: effective_limit(q.limit),
        }
    }
}

pub fn validate(input: &ProductInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("Product name must not be empty"));
    }
    if !input.price.is_finite() || input.price.is_sign_negative() {
        return Err(AppError::validation("Price must be a non-negative number"));
    }
    Ok(())
}
