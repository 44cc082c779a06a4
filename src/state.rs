use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::{jwt::JwtKeys, password::Hasher},
    config::AppConfig,
    users::{
        memory::MemoryUserStore,
        repo::{PgUserStore, UserStore},
    },
};

/// The `users` table is required, so a failed migration aborts startup.
async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub hasher: Hasher,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = if config.uses_memory_store() {
            tracing::warn!("DATABASE_URL selects the in-memory store; data is lost on exit");
            Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
        } else {
            let db = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&config.database_url)
                .await
                .context("connect to database")?;

            run_migrations(&db).await?;
            Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
        };

        Self::from_parts(store, Arc::new(config))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let hasher = Hasher::from_config(&config.password).context("password hasher config")?;
        let jwt = JwtKeys::new(&config.jwt);
        Ok(Self {
            store,
            config,
            hasher,
            jwt,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    #[cfg(test)]
    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig {
            database_url: "memory://".into(),
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 60 * 24 * 30,
            },
            password: crate::auth::password::cheap_config(),
            store_timeout_ms: 200,
            guard_mutations: false,
        };
        tweak(&mut config);

        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(config))
            .expect("fake state should build")
    }
}
