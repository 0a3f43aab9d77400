//! Token repository trait defining the interface for refresh token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainResult;

/// Repository trait for RefreshToken persistence
///
/// Tokens are looked up by the SHA-256 hash of their opaque value; plaintext
/// tokens never reach the repository.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Save a new refresh token
    ///
    /// # Returns
    /// * `Ok(RefreshToken)` - The saved token
    /// * `Err(DomainError)` - Save failed (e.g., duplicate hash, storage down)
    async fn save_refresh_token(&self, token: RefreshToken) -> DomainResult<RefreshToken>;

    /// Find a refresh token by its hashed value, whatever its state
    async fn find_refresh_token(&self, token_hash: &str) -> DomainResult<Option<RefreshToken>>;

    /// Find every refresh token owned by an identity, whatever its state
    async fn find_by_identity(&self, identity_id: Uuid) -> DomainResult<Vec<RefreshToken>>;

    /// Atomically rotate a refresh token
    ///
    /// Revokes the token with `old_hash` and persists `successor` only if the
    /// old token is still unrevoked. Must be a single conditional update so
    /// two concurrent rotations of the same token cannot both succeed.
    ///
    /// # Returns
    /// * `Ok(true)` - This call performed the rotation
    /// * `Ok(false)` - The old token was missing or already revoked
    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        successor: RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Revoke a specific refresh token
    ///
    /// # Returns
    /// * `Ok(true)` - Token was revoked by this call
    /// * `Ok(false)` - Token not found or already revoked
    async fn revoke_token(&self, token_hash: &str, now: DateTime<Utc>) -> DomainResult<bool>;

    /// Revoke all refresh tokens of an identity, returning how many changed
    async fn revoke_all_user_tokens(&self, identity_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize>;

    /// Revoke every token of a rotation family, returning how many changed
    async fn revoke_token_family(&self, family_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize>;

    /// Delete refresh tokens that expired before `now`
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> DomainResult<usize>;

    /// Count tokens of an identity that are still usable at `now`
    async fn count_active_tokens(&self, identity_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize> {
        let tokens = self.find_by_identity(identity_id).await?;
        Ok(tokens.iter().filter(|t| t.is_valid_at(now)).count())
    }
}
