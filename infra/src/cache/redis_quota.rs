//! Redis implementation of the quota and rejection repositories
//!
//! Key patterns (behind the configured prefix):
//! - `quota:{identity}:{day}` - resolution counter for one day
//! - `rejections:{identity}:{day}` - set of candidates passed on that day
//!
//! Both expire two days after their last write, so stale days vanish without
//! a sweep.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, Script};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use kd_core::errors::DomainResult;
use kd_core::repositories::{QuotaRepository, RejectionRepository};

use crate::cache::CacheConfig;
use crate::retry::retry_once;
use crate::InfrastructureError;

/// Lifetime of day-keyed entries
const DAY_KEY_TTL_SECONDS: i64 = 2 * 24 * 3600;

/// Connection attempts before giving up at startup
const MAX_CONNECT_ATTEMPTS: u32 = 3;

/// Increment iff below the limit; returns the new count or -1
const COMPARE_AND_INCREMENT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
    return -1
end
local updated = redis.call('INCR', KEYS[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return updated
"#;

/// Quota counters and rejection sets stored in Redis
#[derive(Clone)]
pub struct RedisQuotaRepository {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this repository
    config: CacheConfig,
    increment_script: Script,
}

impl RedisQuotaRepository {
    /// Connect to Redis, retrying with exponential backoff
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Repository or connection error
    pub async fn connect(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!("Connecting quota store to Redis at {}", mask_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let mut attempts = 0;
        let mut delay = config.retry_delay_ms;
        let connection = loop {
            attempts += 1;
            match client.get_multiplexed_async_connection().await {
                Ok(connection) => break connection,
                Err(e) if attempts < MAX_CONNECT_ATTEMPTS => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, MAX_CONNECT_ATTEMPTS, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        };

        info!("Redis quota store connected");
        Ok(Self {
            connection,
            config,
            increment_script: Script::new(COMPARE_AND_INCREMENT),
        })
    }

    fn quota_key(&self, identity_id: Uuid, day: NaiveDate) -> String {
        self.config.build_key(&format!("quota:{}:{}", identity_id, day))
    }

    fn rejections_key(&self, identity_id: Uuid, day: NaiveDate) -> String {
        self.config.build_key(&format!("rejections:{}:{}", identity_id, day))
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.config.retry_delay_ms)
    }
}

#[async_trait]
impl QuotaRepository for RedisQuotaRepository {
    async fn count(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<u32> {
        let key = self.quota_key(identity_id, day);
        let count: Option<u32> = retry_once("quota.count", self.retry_delay(), || {
            let mut conn = self.connection.clone();
            let key = key.clone();
            async move { conn.get(key).await }
        })
        .await?;
        Ok(count.unwrap_or(0))
    }

    async fn try_increment(&self, identity_id: Uuid, day: NaiveDate, limit: u32) -> DomainResult<Option<u32>> {
        let key = self.quota_key(identity_id, day);
        let result: i64 = retry_once("quota.try_increment", self.retry_delay(), || {
            let mut conn = self.connection.clone();
            let mut invocation = self.increment_script.prepare_invoke();
            invocation.key(key.as_str()).arg(limit).arg(DAY_KEY_TTL_SECONDS);
            async move { invocation.invoke_async(&mut conn).await }
        })
        .await?;

        debug!(identity_id = %identity_id, %day, result, "Quota compare-and-increment");
        Ok(u32::try_from(result).ok())
    }

    async fn prune_before(&self, _day: NaiveDate) -> DomainResult<usize> {
        // Day keys carry a TTL; Redis evicts them on its own
        Ok(0)
    }
}

#[async_trait]
impl RejectionRepository for RedisQuotaRepository {
    async fn add_rejection(&self, identity_id: Uuid, day: NaiveDate, candidate_id: Uuid) -> DomainResult<()> {
        let key = self.rejections_key(identity_id, day);
        retry_once("rejections.add", self.retry_delay(), || {
            let mut conn = self.connection.clone();
            let mut pipe = redis::pipe();
            pipe.atomic()
                .sadd(key.as_str(), candidate_id.to_string())
                .ignore()
                .cmd("EXPIRE")
                .arg(key.as_str())
                .arg(DAY_KEY_TTL_SECONDS)
                .ignore();
            async move { pipe.query_async::<_, ()>(&mut conn).await }
        })
        .await
    }

    async fn rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<HashSet<Uuid>> {
        let key = self.rejections_key(identity_id, day);
        let members: Vec<String> = retry_once("rejections.list", self.retry_delay(), || {
            let mut conn = self.connection.clone();
            let key = key.clone();
            async move { conn.smembers(key).await }
        })
        .await?;

        Ok(members
            .iter()
            .filter_map(|member| match Uuid::parse_str(member) {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(key = %key, member = %member, "Ignoring malformed rejection entry");
                    None
                }
            })
            .collect())
    }

    async fn clear_rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<()> {
        let key = self.rejections_key(identity_id, day);
        retry_once("rejections.clear", self.retry_delay(), || {
            let mut conn = self.connection.clone();
            let key = key.clone();
            async move { conn.del::<_, ()>(key).await }
        })
        .await
    }
}

/// Hide credentials in a Redis URL for logging
fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
