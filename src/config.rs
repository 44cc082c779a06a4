use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost parameters. `None` keeps the argon2 crate default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordConfig {
    pub iterations: Option<u32>,
    pub memory_kib: Option<u32>,
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub store_timeout_ms: u64,
    pub guard_mutations: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: parsed(&get, "JWT_TTL_MINUTES")?.unwrap_or(60 * 24 * 30),
        };
        let password = PasswordConfig {
            iterations: parsed(&get, "PASSWORD_HASH_ITERATIONS")?,
            memory_kib: parsed(&get, "PASSWORD_HASH_MEMORY_KIB")?,
            parallelism: parsed(&get, "PASSWORD_HASH_PARALLELISM")?,
        };
        let port = match parsed(&get, "APP_PORT")? {
            Some(p) => p,
            None => parsed(&get, "PORT")?.unwrap_or(5000),
        };

        Ok(Self {
            database_url,
            db_max_connections: parsed(&get, "DB_MAX_CONNECTIONS")?.unwrap_or(10),
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            password,
            store_timeout_ms: parsed(&get, "STORE_TIMEOUT_MS")?.unwrap_or(5000),
            guard_mutations: parsed(&get, "AUTH_GUARD_MUTATIONS")?.unwrap_or(false),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory:")
    }
}

fn parsed<F, T>(get: &F, key: &str) -> anyhow::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{key}: {e}")),
        None => Ok(None),
    }
}
