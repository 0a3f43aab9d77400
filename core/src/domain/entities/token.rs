//! Token entities for JWT access tokens and rotating refresh tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims structure for the access token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl Claims {
    /// Creates new claims for an access token issued at `now`
    pub fn new_access_token(
        identity_id: Uuid,
        issuer: &str,
        audience: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expiry = now + ttl;

        Self {
            sub: identity_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Checks if the claims are inside their validity window at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        now >= self.nbf && now < self.exp
    }

    /// Gets the identity ID from the claims
    pub fn identity_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Refresh token record held by the credential store
///
/// Only the SHA-256 hash of the opaque token string is stored. Every token
/// belongs to a family started by one login; rotation keeps the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique identifier for the refresh token
    pub id: Uuid,

    /// Identity this token belongs to
    pub identity_id: Uuid,

    /// Hashed token value
    pub token_hash: String,

    /// Rotation chain this token belongs to
    pub family_id: Uuid,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked
    pub is_revoked: bool,

    /// Timestamp of revocation, if any
    pub revoked_at: Option<DateTime<Utc>>,

    /// Successor issued when this token was rotated away
    pub replaced_by: Option<Uuid>,
}

impl RefreshToken {
    /// Creates the first refresh token of a new family
    pub fn new(identity_id: Uuid, token_hash: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self::with_family(identity_id, token_hash, Uuid::new_v4(), now, ttl)
    }

    /// Creates a refresh token in an existing family
    pub fn with_family(
        identity_id: Uuid,
        token_hash: String,
        family_id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity_id,
            token_hash,
            family_id,
            created_at: now,
            expires_at: now + ttl,
            is_revoked: false,
            revoked_at: None,
            replaced_by: None,
        }
    }

    /// Creates the token that replaces this one on rotation
    pub fn successor(&self, token_hash: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self::with_family(self.identity_id, token_hash, self.family_id, now, ttl)
    }

    /// Checks if the refresh token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A token is valid if it hasn't expired and hasn't been revoked
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_revoked
    }

    /// Revokes the refresh token; revoking twice keeps the first timestamp
    pub fn revoke(&mut self, now: DateTime<Utc>) {
        if !self.is_revoked {
            self.is_revoked = true;
            self.revoked_at = Some(now);
        }
    }

    /// Revokes the token as rotated away in favour of `successor`
    pub fn mark_replaced(&mut self, successor: Uuid, now: DateTime<Utc>) {
        self.revoke(now);
        self.replaced_by = Some(successor);
    }
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// Opaque refresh token
    pub refresh_token: String,

    /// Access token expiry time in seconds
    pub access_expires_in: i64,

    /// Refresh token expiry time in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair
    pub fn new(
        access_token: String,
        refresh_token: String,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_expires_in: access_ttl.num_seconds(),
            refresh_expires_in: refresh_ttl.num_seconds(),
        }
    }
}
