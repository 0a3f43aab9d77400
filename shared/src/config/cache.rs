//! Cache configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Redis configuration for quota counters and rejection sets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Optional prefix applied to every key
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Delay before the single retry of a failed command, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            key_prefix: None,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl CacheConfig {
    /// Override fields from `REDIS_*` environment variables
    pub fn from_env_or(base: Self) -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(base.url),
            key_prefix: std::env::var("REDIS_KEY_PREFIX").ok().or(base.key_prefix),
            retry_delay_ms: env_or("REDIS_RETRY_DELAY_MS", base.retry_delay_ms),
        }
    }

    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Build a full key with the optional prefix applied
    pub fn build_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

fn default_retry_delay_ms() -> u64 {
    100
}
