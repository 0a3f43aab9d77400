//! Redis-backed quota counters and rejection sets

pub mod redis_quota;

pub use redis_quota::RedisQuotaRepository;

// Re-export commonly used types
pub use kd_shared::CacheConfig;
