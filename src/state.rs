use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::store::{
    DiscountRepo, MemoryStore, PgStore, ProductRepo, StoreHealth, UserRepo,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub products: Arc<dyn ProductRepo>,
    pub discounts: Arc<dyn DiscountRepo>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        match config.database_url.as_deref() {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url, config.db_max_connections).await?);
                info!("using postgres store");
                Ok(Self::from_parts(config, store))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                Ok(Self::from_parts(config, Arc::new(MemoryStore::new())))
            }
        }
    }

    pub fn from_parts<S>(config: Arc<AppConfig>, store: Arc<S>) -> Self
    where
        S: UserRepo + ProductRepo + DiscountRepo + StoreHealth + 'static,
    {
        Self {
            keys: JwtKeys::from_config(&config.jwt),
            config,
            users: store.clone(),
            products: store.clone(),
            discounts: store.clone(),
            health: store,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        });
        Self::from_parts(config, Arc::new(MemoryStore::new()))
    }
}
