//! Configuration module with business-specific sub-modules
//!
//! - `auth` - JWT and refresh-token configuration
//! - `cache` - Redis configuration for quota counters
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `matching` - Daily quotas, reference timezone and pool policies

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod matching;

use serde::{Deserialize, Serialize};

pub use auth::{JwtConfig, ReusePolicy};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use matching::{ExhaustedPolicy, MatchingConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration
    pub cache: CacheConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Matching and quota configuration
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            jwt: JwtConfig::default(),
            matching: MatchingConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig::new("mysql://localhost:3306/kindred_dev"),
            cache: CacheConfig::default(),
            jwt: JwtConfig::default(),
            matching: MatchingConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig::new("mysql://prod-db:3306/kindred")
                .with_max_connections(50),
            cache: CacheConfig::new("redis://prod-cache:6379").with_key_prefix("kindred"),
            jwt: JwtConfig::default().with_access_expiry_minutes(10),
            matching: MatchingConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Load configuration from environment
    ///
    /// The environment preset supplies defaults; individual sections are then
    /// overridden from their own variables.
    pub fn from_env() -> Self {
        let env = Environment::from_env();
        let mut config = match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::development();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        };

        config.database = DatabaseConfig::from_env_or(config.database);
        config.cache = CacheConfig::from_env_or(config.cache);
        config.jwt = JwtConfig::from_env_or(config.jwt);
        config.matching = MatchingConfig::from_env_or(config.matching);
        config.logging = LoggingConfig::from_env_or(config.logging);
        config
    }
}

/// Read an environment variable and parse it, falling back on absence or parse failure
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_preset() {
        let config = AppConfig::production();
        assert!(config.environment.is_production());
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.jwt.access_token_expiry, 600);
        assert_eq!(config.cache.key_prefix.as_deref(), Some("kindred"));
        // Production must supply JWT_SECRET; the preset only carries the placeholder
        assert!(config.jwt.is_using_default_secret());
    }

    #[test]
    fn test_development_preset_uses_default_quota() {
        let config = AppConfig::development();
        assert_eq!(config.matching.free_daily_limit, 2);
        assert_eq!(config.matching.premium_daily_limit, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("KD_TEST_ENV_OR_GARBAGE", "not-a-number");
        assert_eq!(env_or("KD_TEST_ENV_OR_GARBAGE", 7u32), 7);
        std::env::set_var("KD_TEST_ENV_OR_GARBAGE", "12");
        assert_eq!(env_or("KD_TEST_ENV_OR_GARBAGE", 7u32), 12);
        std::env::remove_var("KD_TEST_ENV_OR_GARBAGE");
    }
}
