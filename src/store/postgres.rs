use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    Discount, DiscountFilter, DiscountInput, DiscountRepo, NewUser, Product, ProductFilter,
    ProductInput, ProductRepo, StoreError, StoreHealth, StoreResult, User, UserFilter, UserRepo,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;

        Ok(Self { pool })
    }
}

/// Ids that are not UUIDs cannot exist in these tables.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

/// `%needle%` for ILIKE with the wildcard characters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn map_unique(e: sqlx::Error, field: &'static str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(field),
        _ => StoreError::Database(e),
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", r.id)))?;
        Ok(User {
            id: r.id.to_string(),
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            role,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    image_url: String,
    price: f64,
    marketplace_link: String,
    discount_id: Option<String>,
    category: Option<String>,
    created_at: OffsetDateTime,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id.to_string(),
            name: r.name,
            description: r.description,
            image_url: r.image_url,
            price: r.price,
            marketplace_link: r.marketplace_link,
            discount_id: r.discount_id,
            category: r.category,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct DiscountRow {
    id: Uuid,
    percentage: i32,
    start_date: OffsetDateTime,
    end_date: OffsetDateTime,
    active: bool,
    created_at: OffsetDateTime,
}

impl From<DiscountRow> for Discount {
    fn from(r: DiscountRow) -> Self {
        Discount {
            id: r.id.to_string(),
            percentage: r.percentage,
            start_date: r.start_date,
            end_date: r.end_date,
            active: r.active,
            created_at: r.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, image_url, price, marketplace_link, discount_id, category, created_at";
const DISCOUNT_COLUMNS: &str = "id, percentage, start_date, end_date, active, created_at";

#[async_trait]
impl UserRepo for PgStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Email"))?;
        row.try_into()
    }

    async fn find_one(&self, id: &str) -> StoreResult<Option<User>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_many(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY created_at ASC
            LIMIT $2
            "#
        ))
        .bind(filter.name_contains.as_deref().map(like_pattern))
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductRepo for PgStore {
    async fn create(&self, input: ProductInput) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products
                (name, description, image_url, price, marketplace_link, discount_id, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.price)
        .bind(&input.marketplace_link)
        .bind(&input.discount_id)
        .bind(&input.category)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_one(&self, id: &str) -> StoreResult<Option<Product>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_many(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::float8 IS NULL OR price >= $3)
              AND ($4::float8 IS NULL OR price <= $4)
            ORDER BY created_at ASC
            LIMIT $5
            "#
        ))
        .bind(filter.name_contains.as_deref().map(like_pattern))
        .bind(&filter.category)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_by_id(&self, id: &str, input: ProductInput) -> StoreResult<Option<Product>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
               SET name = $2, description = $3, image_url = $4, price = $5,
                   marketplace_link = $6, discount_id = $7, category = $8
             WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.price)
        .bind(&input.marketplace_link)
        .bind(&input.discount_id)
        .bind(&input.category)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl DiscountRepo for PgStore {
    async fn create(&self, input: DiscountInput) -> StoreResult<Discount> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            r#"
            INSERT INTO discounts (percentage, start_date, end_date, active)
            VALUES ($1, $2, $3, $4)
            RETURNING {DISCOUNT_COLUMNS}
            "#
        ))
        .bind(input.percentage)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_one(&self, id: &str) -> StoreResult<Option<Discount>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_many(&self, filter: &DiscountFilter) -> StoreResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            r#"
            SELECT {DISCOUNT_COLUMNS}
            FROM discounts
            WHERE ($1::bool IS NULL OR active = $1)
            ORDER BY created_at ASC
            LIMIT $2
            "#
        ))
        .bind(filter.active)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_by_id(
        &self,
        id: &str,
        input: DiscountInput,
    ) -> StoreResult<Option<Discount>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            r#"
            UPDATE discounts
               SET percentage = $2, start_date = $3, end_date = $4, active = $5
             WHERE id = $1
            RETURNING {DISCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.percentage)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let res = sqlx::query("DELETE FROM discounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
