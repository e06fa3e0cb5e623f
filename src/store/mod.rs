//! Typed repositories over the document store.
//!
//! Each entity gets its own trait so handlers only see the capability they
//! need. Ids are opaque strings; an id a backend cannot interpret behaves
//! like a missing record.

use async_trait::async_trait;

pub mod memory;
pub mod postgres;
mod types;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use types::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint hit; carries the field that collided.
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn find_one(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_many(&self, filter: &UserFilter) -> StoreResult<Vec<User>>;
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn create(&self, input: ProductInput) -> StoreResult<Product>;
    async fn find_one(&self, id: &str) -> StoreResult<Option<Product>>;
    async fn find_many(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;
    /// Full replace. `None` when no product has this id.
    async fn update_by_id(&self, id: &str, input: ProductInput) -> StoreResult<Option<Product>>;
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait DiscountRepo: Send + Sync {
    async fn create(&self, input: DiscountInput) -> StoreResult<Discount>;
    async fn find_one(&self, id: &str) -> StoreResult<Option<Discount>>;
    async fn find_many(&self, filter: &DiscountFilter) -> StoreResult<Vec<Discount>>;
    async fn update_by_id(&self, id: &str, input: DiscountInput)
        -> StoreResult<Option<Discount>>;
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}
