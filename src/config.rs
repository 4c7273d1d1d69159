use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Which backing store the resource collections live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub db: Option<DbConfig>,
    pub jwt: JwtConfig,
    /// `Secure` is set on the session cookie unless running in local development.
    pub secure_cookies: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };

        let db = match store {
            StoreBackend::Postgres => Some(DbConfig {
                url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", 20),
                min_connections: env_or("DB_MIN_CONNECTIONS", 5),
                idle_timeout: Duration::from_secs(env_or("DB_IDLE_TIMEOUT_SECS", 30)),
                acquire_timeout: Duration::from_secs(env_or("DB_ACQUIRE_TIMEOUT_SECS", 5)),
            }),
            StoreBackend::Memory => None,
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "scribe".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "scribe-users".into()),
            ttl_minutes: env_or("SESSION_TTL_MINUTES", 60 * 24 * 7),
        };

        let secure_cookies = std::env::var("APP_ENV")
            .map(|v| v != "development")
            .unwrap_or(true);

        Ok(Self {
            store,
            db,
            jwt,
            secure_cookies,
        })
    }

    /// In-memory configuration used by `AppState::fake` and the test suites.
    pub fn for_tests() -> Self {
        Self {
            store: StoreBackend::Memory,
            db: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24 * 7,
            },
            secure_cookies: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("SCRIBE_TEST_NUMBER", "not-a-number");
        assert_eq!(env_or("SCRIBE_TEST_NUMBER", 7u32), 7);
        std::env::set_var("SCRIBE_TEST_NUMBER", "42");
        assert_eq!(env_or("SCRIBE_TEST_NUMBER", 7u32), 42);
    }

    #[test]
    fn test_config_is_a_seven_day_memory_setup() {
        let cfg = AppConfig::for_tests();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.db.is_none());
        assert_eq!(cfg.jwt.ttl_minutes, 10080);
        assert!(!cfg.secure_cookies);
    }
}
