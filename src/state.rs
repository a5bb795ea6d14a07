use crate::config::{AppConfig, StoreKind};
use crate::users::{
    memory::MemoryUserStore,
    password::PasswordHasher,
    repo::{PgUserStore, UserStore},
    services::UserService,
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub config: Arc<AppConfig>,
    /// Present only with the postgres store; used for migrations.
    pub db: Option<PgPool>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let hasher = PasswordHasher::new(&config.hash)?;

        let (store, db) = match config.store {
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
                (store, Some(db))
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory user store; users are lost on restart");
                (Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>, None)
            }
        };

        Ok(Self::from_parts(UserService::new(store, hasher), config, db))
    }

    pub fn from_parts(users: UserService, config: Arc<AppConfig>, db: Option<PgPool>) -> Self {
        Self { users, config, db }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::users::password::test_hash_config;

        let config = Arc::new(AppConfig {
            store: StoreKind::Memory,
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            hash: test_hash_config(),
        });
        let hasher = PasswordHasher::new(&config.hash).expect("test argon2 params");
        let users = UserService::new(Arc::new(MemoryUserStore::new()), hasher);
        Self::from_parts(users, config, None)
    }
}
