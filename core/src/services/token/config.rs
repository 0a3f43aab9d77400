//! Configuration for the token service

use chrono::Duration;
use jsonwebtoken::Algorithm;
use kd_shared::{JwtConfig, ReusePolicy};
use std::str::FromStr;

use crate::errors::DomainError;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT signing algorithm; only HMAC algorithms are supported
    pub algorithm: Algorithm,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Issuer claim written and required
    pub issuer: String,
    /// Audience claim written and required
    pub audience: String,
    /// Response to refresh-token reuse
    pub reuse_policy: ReusePolicy,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::try_from(&JwtConfig::default()).unwrap_or_else(|_| Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
            issuer: "kindred".to_string(),
            audience: "kindred-api".to_string(),
            reuse_policy: ReusePolicy::Reject,
        })
    }
}

impl TryFrom<&JwtConfig> for TokenServiceConfig {
    type Error = DomainError;

    fn try_from(config: &JwtConfig) -> Result<Self, Self::Error> {
        let algorithm = Algorithm::from_str(&config.algorithm).map_err(|_| DomainError::Validation {
            message: format!("Unsupported JWT algorithm: {}", config.algorithm),
        })?;
        if config.access_token_expiry <= 0 || config.refresh_token_expiry <= 0 {
            return Err(DomainError::Validation {
                message: "Token lifetimes must be positive".to_string(),
            });
        }

        Ok(Self {
            jwt_secret: config.secret.clone(),
            algorithm,
            access_token_ttl: Duration::seconds(config.access_token_expiry),
            refresh_token_ttl: Duration::seconds(config.refresh_token_expiry),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            reuse_policy: config.reuse_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_jwt_config() {
        let jwt = JwtConfig::new("secret")
            .with_access_expiry_minutes(5)
            .with_reuse_policy(ReusePolicy::RevokeFamily);
        let config = TokenServiceConfig::try_from(&jwt).unwrap();

        assert_eq!(config.algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_ttl, Duration::minutes(5));
        assert_eq!(config.refresh_token_ttl, Duration::days(30));
        assert_eq!(config.reuse_policy, ReusePolicy::RevokeFamily);
    }

    #[test]
    fn test_rejects_unknown_algorithm_and_zero_ttl() {
        let mut jwt = JwtConfig::default();
        jwt.algorithm = "XX999".to_string();
        assert!(TokenServiceConfig::try_from(&jwt).is_err());

        let mut jwt = JwtConfig::default();
        jwt.access_token_expiry = 0;
        assert!(TokenServiceConfig::try_from(&jwt).is_err());
    }
}
