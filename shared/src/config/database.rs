//! Database configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Database configuration for the MySQL refresh-token store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("mysql://localhost:3306/kindred"),
            max_connections: 10,
            connect_timeout: 30,
            idle_timeout: 600,
        }
    }
}

impl DatabaseConfig {
    /// Override fields from `DATABASE_*` environment variables
    pub fn from_env_or(base: Self) -> Self {
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or(base.url),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", base.max_connections),
            connect_timeout: env_or("DATABASE_CONNECT_TIMEOUT", base.connect_timeout),
            idle_timeout: env_or("DATABASE_IDLE_TIMEOUT", base.idle_timeout),
        }
    }

    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}
