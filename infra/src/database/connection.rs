//! MySQL pool setup for the refresh-token table

use std::str::FromStr;
use std::time::Duration;

use kd_shared::DatabaseConfig;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    ConnectOptions, MySqlPool,
};
use tracing::log::LevelFilter;

use super::mysql::MySqlTokenRepository;
use crate::InfrastructureError;

/// Statements slower than this are logged at warn level
const SLOW_STATEMENT: Duration = Duration::from_millis(500);

/// Shared MySQL pool
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    /// Open a pool sized and timed from `config`
    ///
    /// # Arguments
    /// * `config` - URL, pool size and timeouts
    pub async fn new(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        let connect_options = MySqlConnectOptions::from_str(&config.url)
            .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))?
            .log_statements(LevelFilter::Trace)
            .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Could not open database pool");
                InfrastructureError::Database(e)
            })?;

        tracing::info!(max_connections = config.max_connections, "Database pool open");
        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Token repository over this pool, with its table created if missing
    pub async fn token_repository(&self) -> Result<MySqlTokenRepository, InfrastructureError> {
        let repository = MySqlTokenRepository::new(self.pool.clone());
        repository.ensure_schema().await?;
        Ok(repository)
    }

    /// Round-trip a trivial query
    pub async fn health_check(&self) -> Result<(), InfrastructureError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::warn!(error = %e, "Database health check failed");
            InfrastructureError::Database(e)
        })?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
