//! Main authentication service implementation

use std::sync::Arc;

use crate::domain::entities::TokenPair;
use crate::errors::{AuthError, DomainResult};
use crate::repositories::{IdentityDirectory, TokenRepository};
use crate::services::token::TokenService;

use super::password::PasswordVerifier;

/// Login, refresh and logout on top of the token service
pub struct AuthService<T, D, P>
where
    T: TokenRepository,
    D: IdentityDirectory,
    P: PasswordVerifier,
{
    /// Token service for credential issuance
    token_service: Arc<TokenService<T>>,
    /// Directory holding identities and credential hashes
    directory: Arc<D>,
    /// Password hash checker
    verifier: Arc<P>,
}

impl<T, D, P> AuthService<T, D, P>
where
    T: TokenRepository,
    D: IdentityDirectory,
    P: PasswordVerifier,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `token_service` - Service for token issuance and rotation
    /// * `directory` - Identity lookup by email and id
    /// * `verifier` - Password hash verification
    pub fn new(token_service: Arc<TokenService<T>>, directory: Arc<D>, verifier: Arc<P>) -> Self {
        Self {
            token_service,
            directory,
            verifier,
        }
    }

    /// Authenticate with email and password
    ///
    /// An unknown email and a wrong password both fail with
    /// `AuthError::InvalidCredentials`. Unverified accounts may sign in;
    /// they are kept out of matching instead.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - A new pair starting a fresh refresh token family
    /// * `Err(AuthError::InvalidCredentials)` - Unknown email or wrong password
    /// * `Err(AuthError::AccountInactive)` - Account deactivated
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<TokenPair> {
        let identity = match self.directory.find_by_email(email.trim()).await? {
            Some(identity) => identity,
            None => {
                tracing::info!("Login failed: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.verifier.verify(password, &identity.credential_hash) {
            tracing::info!(identity_id = %identity.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !identity.is_active {
            tracing::warn!(identity_id = %identity.id, "Login attempt on inactive account");
            return Err(AuthError::AccountInactive.into());
        }

        let pair = self.token_service.issue(identity.id).await?;
        tracing::info!(identity_id = %identity.id, "Login succeeded");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair
    ///
    /// If the account was deactivated since the last login, the freshly
    /// rotated token is revoked again and the call fails.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let pair = self.token_service.rotate(refresh_token).await?;
        let identity_id = self.token_service.verify_identity(&pair.access_token)?;

        match self.directory.find_by_id(identity_id).await? {
            Some(identity) if identity.is_active => Ok(pair),
            _ => {
                self.token_service.revoke(&pair.refresh_token).await?;
                tracing::warn!(identity_id = %identity_id, "Refresh refused for inactive account");
                Err(AuthError::AccountInactive.into())
            }
        }
    }

    /// End one session by revoking its refresh token
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        self.token_service.revoke(refresh_token).await
    }

    /// End every session of the bearer of `access_token`
    ///
    /// # Returns
    ///
    /// Number of refresh tokens revoked
    pub async fn logout_everywhere(&self, access_token: &str) -> DomainResult<usize> {
        let identity_id = self.token_service.verify_identity(access_token)?;
        self.token_service.revoke_all(identity_id).await
    }
}
