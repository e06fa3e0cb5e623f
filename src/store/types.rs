use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::roles::Role;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// User record. The hash never leaves the server; see `auth::dto::PublicUser`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name_contains: Option<String>,
    pub limit: i64,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.name_contains
            .as_deref()
            .map_or(true, |q| contains_ignore_case(&user.name, q))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub marketplace_link: String,
    pub discount_id: Option<String>,
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Writable product fields; updates replace all of them.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub marketplace_link: String,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub name_contains: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: i64,
}

impl ProductFilter {
    pub fn matches(&self, p: &Product) -> bool {
        self.name_contains
            .as_deref()
            .map_or(true, |q| contains_ignore_case(&p.name, q))
            && self
                .category
                .as_deref()
                .map_or(true, |c| p.category.as_deref() == Some(c))
            && self.min_price.map_or(true, |min| p.price >= min)
            && self.max_price.map_or(true, |max| p.price <= max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Discount {
    pub id: String,
    pub percentage: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountInput {
    pub percentage: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct DiscountFilter {
    pub active: Option<bool>,
    pub limit: i64,
}

impl DiscountFilter {
    pub fn matches(&self, d: &Discount) -> bool {
        self.active.map_or(true, |a| d.active == a)
    }
}

/// Clamps a caller-supplied row cap into `0..=MAX_LIMIT`.
pub fn effective_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
