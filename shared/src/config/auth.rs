//! Authentication and session-token configuration

use serde::{Deserialize, Serialize};

use super::env_or;

const DEFAULT_SECRET: &str = "development-secret-please-change-in-production";

/// What the token service does when a rotated-away or unknown refresh token is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Reject the presented token; the rest of its family stays usable
    #[default]
    Reject,
    /// Reject and revoke every refresh token of the presented token's family
    RevokeFamily,
}

impl std::str::FromStr for ReusePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(ReusePolicy::Reject),
            "revoke_family" | "revoke-family" => Ok(ReusePolicy::RevokeFamily),
            _ => Err(format!("Invalid reuse policy: {}", s)),
        }
    }
}

/// JWT authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub secret: String,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,

    /// Algorithm for JWT signing (HS256, HS384, HS512)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Response to refresh-token reuse
    #[serde(default)]
    pub reuse_policy: ReusePolicy,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            access_token_expiry: 900,        // 15 minutes
            refresh_token_expiry: 2_592_000, // 30 days
            issuer: String::from("kindred"),
            audience: String::from("kindred-api"),
            algorithm: default_algorithm(),
            reuse_policy: ReusePolicy::default(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Override fields from `JWT_*` environment variables
    pub fn from_env_or(base: Self) -> Self {
        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(base.secret),
            access_token_expiry: env_or("JWT_ACCESS_TOKEN_EXPIRY", base.access_token_expiry),
            refresh_token_expiry: env_or("JWT_REFRESH_TOKEN_EXPIRY", base.refresh_token_expiry),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(base.issuer),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or(base.audience),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or(base.algorithm),
            reuse_policy: env_or("JWT_REUSE_POLICY", base.reuse_policy),
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Set the reuse policy
    pub fn with_reuse_policy(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    /// Check if using the built-in or a blank secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        let secret = self.secret.trim();
        secret.is_empty() || secret == DEFAULT_SECRET
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}
