use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Discount, DiscountFilter, DiscountInput, DiscountRepo, NewUser, Product, ProductFilter,
    ProductInput, ProductRepo, StoreError, StoreHealth, StoreResult, User, UserFilter, UserRepo,
};

/// In-process store used when no `DATABASE_URL` is configured, and by tests.
/// Vectors keep insertion order, which is also the listing order.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    products: RwLock<Vec<Product>>,
    discounts: RwLock<Vec<Discount>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn take<T>(items: impl Iterator<Item = T>, limit: i64) -> Vec<T> {
    items.take(usize::try_from(limit).unwrap_or(0)).collect()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("Email"));
        }
        let user = User {
            id: new_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_one(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_many(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(take(
            users.iter().filter(|u| filter.matches(u)).cloned(),
            filter.limit,
        ))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[async_trait]
impl ProductRepo for MemoryStore {
    async fn create(&self, input: ProductInput) -> StoreResult<Product> {
        let product = Product {
            id: new_id(),
            name: input.name,
            description: input.description,
            image_url: input.image_url,
            price: input.price,
            marketplace_link: input.marketplace_link,
            discount_id: input.discount_id,
            category: input.category,
            created_at: OffsetDateTime::now_utc(),
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn find_one(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_many(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(take(
            products.iter().filter(|p| filter.matches(p)).cloned(),
            filter.limit,
        ))
    }

    async fn update_by_id(&self, id: &str, input: ProductInput) -> StoreResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(p) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        p.name = input.name;
        p.description = input.description;
        p.image_url = input.image_url;
        p.price = input.price;
        p.marketplace_link = input.marketplace_link;
        p.discount_id = input.discount_id;
        p.category = input.category;
        Ok(Some(p.clone()))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

#[async_trait]
impl DiscountRepo for MemoryStore {
    async fn create(&self, input: DiscountInput) -> StoreResult<Discount> {
        let discount = Discount {
            id: new_id(),
            percentage: input.percentage,
            start_date: input.start_date,
            end_date: input.end_date,
            active: input.active,
            created_at: OffsetDateTime::now_utc(),
        };
        self.discounts.write().await.push(discount.clone());
        Ok(discount)
    }

    async fn find_one(&self, id: &str) -> StoreResult<Option<Discount>> {
        Ok(self
            .discounts
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_many(&self, filter: &DiscountFilter) -> StoreResult<Vec<Discount>> {
        let discounts = self.discounts.read().await;
        Ok(take(
            discounts.iter().filter(|d| filter.matches(d)).cloned(),
            filter.limit,
        ))
    }

    async fn update_by_id(
        &self,
        id: &str,
        input: DiscountInput,
    ) -> StoreResult<Option<Discount>> {
        let mut discounts = self.discounts.write().await;
        let Some(d) = discounts.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        d.percentage = input.percentage;
        d.start_date = input.start_date;
        d.end_date = input.end_date;
        d.active = input.active;
        Ok(Some(d.clone()))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let mut discounts = self.discounts.write().await;
        let before = discounts.len();
        discounts.retain(|d| d.id != id);
        Ok(discounts.len() != before)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use time::macros::datetime;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        }
    }

    fn input(name: &str, price: f64) -> ProductInput {
        ProductInput {
            name: name.into(),
            description: "d".into(),
            image_url: "https://img.local/x.png".into(),
            price,
            marketplace_link: "https://shop.local/x".into(),
            discount_id: None,
            category: Some("batik".into()),
        }
    }

    fn discount(percentage: i32, active: bool) -> DiscountInput {
        DiscountInput {
            percentage,
            start_date: datetime!(2026-01-01 0:00 UTC),
            end_date: datetime!(2026-03-01 0:00 UTC),
            active,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryStore::new();
        UserRepo::create(&store, new_user("a@x.com")).await.expect("first insert");
        let err = UserRepo::create(&store, new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("Email")));
    }

    #[tokio::test]
    async fn delete_removes_user_once() {
        let store = MemoryStore::new();
        let user = UserRepo::create(&store, new_user("a@x.com")).await.unwrap();
        assert!(UserRepo::delete_by_id(&store, &user.id).await.unwrap());
        assert!(!UserRepo::delete_by_id(&store, &user.id).await.unwrap());
        assert!(UserRepo::find_one(&store, &user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn product_update_replaces_all_fields() {
        let store = MemoryStore::new();
        let created = ProductRepo::create(&store, input("Old", 5.0)).await.unwrap();

        let mut replacement = input("New", 7.5);
        replacement.category = None;
        let updated = ProductRepo::update_by_id(&store, &created.id, replacement)
            .await
            .unwrap()
            .expect("product exists");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "New");
        assert_eq!(updated.price, 7.5);
        assert_eq!(updated.category, None);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn find_many_respects_filter_and_limit() {
        let store = MemoryStore::new();
        for (name, price) in [("a", 5.0), ("b", 10.0), ("c", 30.0), ("d", 50.0), ("e", 80.0)] {
            ProductRepo::create(&store, input(name, price)).await.unwrap();
        }
        let filter = ProductFilter {
            min_price: Some(10.0),
            max_price: Some(50.0),
            limit: 100,
            ..Default::default()
        };
        let names: Vec<_> = ProductRepo::find_many(&store, &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["b", "c", "d"]);

        let capped = ProductFilter { limit: 2, ..filter };
        assert_eq!(ProductRepo::find_many(&store, &capped).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_missing_product_is_none() {
        let store = MemoryStore::new();
        let res = ProductRepo::update_by_id(&store, "nope", input("x", 1.0)).await.unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn discount_update_replaces_and_delete_is_once() {
        let store = MemoryStore::new();
        let created = DiscountRepo::create(&store, discount(20, true)).await.unwrap();

        let mut replacement = discount(35, false);
        replacement.end_date = datetime!(2026-06-01 0:00 UTC);
        let updated = DiscountRepo::update_by_id(&store, &created.id, replacement)
            .await
            .unwrap()
            .expect("discount exists");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.percentage, 35);
        assert!(!updated.active);
        assert_eq!(updated.end_date, datetime!(2026-06-01 0:00 UTC));
        assert_eq!(updated.created_at, created.created_at);

        let inactive = DiscountFilter { active: Some(false), limit: 100 };
        assert_eq!(DiscountRepo::find_many(&store, &inactive).await.unwrap().len(), 1);

        assert!(DiscountRepo::delete_by_id(&store, &created.id).await.unwrap());
        assert!(!DiscountRepo::delete_by_id(&store, &created.id).await.unwrap());
        assert!(DiscountRepo::find_one(&store, &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_discount_is_none() {
        let store = MemoryStore::new();
        let res = DiscountRepo::update_by_id(&store, "nope", discount(10, true)).await.unwrap();
        assert!(res.is_none());
        assert!(!DiscountRepo::delete_by_id(&store, "nope").await.unwrap());
    }
}
