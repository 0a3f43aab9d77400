//! Main token service implementation

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use kd_shared::{telemetry::log_security_event, ReusePolicy};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, RefreshToken, TokenPair};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::TokenRepository;
use crate::services::clock::Clock;

use super::config::TokenServiceConfig;

/// Bytes of entropy in an opaque refresh token
const REFRESH_TOKEN_BYTES: usize = 32;

/// Service for issuing, verifying, rotating and revoking session credentials
pub struct TokenService<R: TokenRepository> {
    pub(crate) repository: Arc<R>,
    clock: Arc<dyn Clock>,
    config: TokenServiceConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl<R: TokenRepository> TokenService<R> {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `repository` - Credential store for refresh token records
    /// * `clock` - Time source for issuance and expiry checks
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService`, or a validation error for an empty secret or a
    /// non-HMAC algorithm
    pub fn new(
        repository: Arc<R>,
        clock: Arc<dyn Clock>,
        config: TokenServiceConfig,
    ) -> DomainResult<Self> {
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(DomainError::Validation {
                message: format!("Unsupported signing algorithm: {:?}", config.algorithm),
            });
        }
        if config.jwt_secret.is_empty() {
            return Err(DomainError::Validation {
                message: "JWT secret must not be empty".to_string(),
            });
        }

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        // Time checks run against the injected clock, not the system time
        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Ok(Self {
            repository,
            clock,
            config,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Access token lifetime
    pub fn access_token_ttl(&self) -> chrono::Duration {
        self.config.access_token_ttl
    }

    /// Issues a fresh credential pair for an identity
    ///
    /// Every call starts a new refresh token family, so repeated logins never
    /// collide with earlier sessions.
    ///
    /// # Arguments
    ///
    /// * `identity_id` - The identity to authenticate
    ///
    /// # Returns
    ///
    /// A `TokenPair` whose refresh token is persisted as a hash only
    pub async fn issue(&self, identity_id: Uuid) -> DomainResult<TokenPair> {
        let now = self.clock.now();
        let refresh_token = generate_refresh_secret();
        let record = RefreshToken::new(
            identity_id,
            hash_token(&refresh_token),
            now,
            self.config.refresh_token_ttl,
        );
        let family_id = record.family_id;
        self.repository.save_refresh_token(record).await?;

        let access_token = self.generate_access_token(identity_id)?;

        tracing::info!(
            identity_id = %identity_id,
            family_id = %family_id,
            "Issued new token pair"
        );

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_ttl,
            self.config.refresh_token_ttl,
        ))
    }

    /// Generates a signed JWT access token
    fn generate_access_token(&self, identity_id: Uuid) -> DomainResult<String> {
        let claims = Claims::new_access_token(
            identity_id,
            &self.config.issuer,
            &self.config.audience,
            self.clock.now(),
            self.config.access_token_ttl,
        );
        let header = Header::new(self.config.algorithm);

        encode(&header, &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            TokenError::TokenGenerationFailed.into()
        })
    }

    /// Verifies an access token and returns its claims
    ///
    /// Bad signatures, malformed input, foreign issuers or audiences and
    /// expired tokens all fail with `TokenError::AuthInvalid`.
    pub fn verify_access(&self, token: &str) -> DomainResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                DomainError::from(TokenError::AuthInvalid)
            })?;

        if !claims.is_valid_at(self.clock.now()) {
            tracing::debug!(jti = %claims.jti, "Access token outside its validity window");
            return Err(TokenError::AuthInvalid.into());
        }

        Ok(claims)
    }

    /// Verifies an access token and returns the identity it was issued to
    pub fn verify_identity(&self, token: &str) -> DomainResult<Uuid> {
        self.verify_access(token)?
            .identity_id()
            .map_err(|_| TokenError::AuthInvalid.into())
    }

    /// Exchanges a refresh token for a new credential pair
    ///
    /// The presented token is revoked and its successor stored in the same
    /// family through one conditional update, so concurrent rotations of one
    /// token yield exactly one winner.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The new pair
    /// * `Err(TokenError::RefreshReuseDetected)` - Token unknown, already
    ///   rotated or revoked, or rotated concurrently by another caller
    /// * `Err(TokenError::AuthInvalid)` - Token expired
    pub async fn rotate(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let now = self.clock.now();
        let token_hash = hash_token(refresh_token);

        let current = match self.repository.find_refresh_token(&token_hash).await? {
            Some(token) => token,
            None => return self.reject_reuse(None).await,
        };

        if current.is_revoked {
            return self.reject_reuse(Some(&current)).await;
        }
        if current.is_expired_at(now) {
            tracing::debug!(identity_id = %current.identity_id, "Expired refresh token presented");
            return Err(TokenError::AuthInvalid.into());
        }

        let next_refresh = generate_refresh_secret();
        let successor = current.successor(
            hash_token(&next_refresh),
            now,
            self.config.refresh_token_ttl,
        );

        if !self
            .repository
            .rotate_refresh_token(&token_hash, successor, now)
            .await?
        {
            // Another caller rotated the same token first
            return self.reject_reuse(Some(&current)).await;
        }

        let access_token = self.generate_access_token(current.identity_id)?;

        tracing::info!(
            identity_id = %current.identity_id,
            family_id = %current.family_id,
            "Rotated refresh token"
        );

        Ok(TokenPair::new(
            access_token,
            next_refresh,
            self.config.access_token_ttl,
            self.config.refresh_token_ttl,
        ))
    }

    /// Applies the reuse policy and fails the rotation
    async fn reject_reuse(&self, presented: Option<&RefreshToken>) -> DomainResult<TokenPair> {
        match presented {
            Some(token) => {
                let identity = token.identity_id.to_string();
                log_security_event(
                    "refresh_token_reuse",
                    Some(&identity),
                    "Rotated-away or revoked refresh token presented",
                );

                if self.config.reuse_policy == ReusePolicy::RevokeFamily {
                    let revoked = self
                        .repository
                        .revoke_token_family(token.family_id, self.clock.now())
                        .await?;
                    tracing::warn!(
                        identity_id = %token.identity_id,
                        family_id = %token.family_id,
                        revoked,
                        "Revoked refresh token family after reuse"
                    );
                }
            }
            None => {
                log_security_event("refresh_token_reuse", None, "Unknown refresh token presented");
            }
        }

        Err(TokenError::RefreshReuseDetected.into())
    }

    /// Revokes a single refresh token
    ///
    /// Idempotent: revoking an unknown or already revoked token succeeds.
    pub async fn revoke(&self, refresh_token: &str) -> DomainResult<()> {
        let revoked = self
            .repository
            .revoke_token(&hash_token(refresh_token), self.clock.now())
            .await?;

        if revoked {
            tracing::info!("Revoked refresh token");
        } else {
            tracing::debug!("Revoke requested for unknown or already revoked token");
        }
        Ok(())
    }

    /// Revokes every refresh token of an identity
    pub async fn revoke_all(&self, identity_id: Uuid) -> DomainResult<usize> {
        let count = self
            .repository
            .revoke_all_user_tokens(identity_id, self.clock.now())
            .await?;

        tracing::info!(identity_id = %identity_id, count, "Revoked all refresh tokens");
        Ok(count)
    }

    /// Deletes refresh tokens that are past their expiry
    pub async fn cleanup_expired(&self) -> DomainResult<usize> {
        let deleted = self.repository.delete_expired_tokens(self.clock.now()).await?;
        if deleted > 0 {
            tracing::info!(deleted, "Removed expired refresh tokens");
        }
        Ok(deleted)
    }
}

/// Hashes an opaque token for storage and lookup
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generates a URL-safe opaque refresh token
fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
