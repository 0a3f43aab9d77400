//! Mock implementation of TokenRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::{DomainError, DomainResult};

use super::TokenRepository;

/// Mock token repository for testing
#[derive(Clone, Default)]
pub struct MockTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl MockTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored token
    pub async fn all(&self) -> Vec<RefreshToken> {
        self.tokens.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> DomainResult<RefreshToken> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token_hash) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> DomainResult<Option<RefreshToken>> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }

    async fn find_by_identity(&self, identity_id: Uuid) -> DomainResult<Vec<RefreshToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.identity_id == identity_id)
            .cloned()
            .collect())
    }

    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        successor: RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(old_hash) {
            Some(old) if !old.is_revoked => old.mark_replaced(successor.id, now),
            _ => return Ok(false),
        }
        tokens.insert(successor.token_hash.clone(), successor);
        Ok(true)
    }

    async fn revoke_token(&self, token_hash: &str, now: DateTime<Utc>) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token_hash) {
            Some(token) if !token.is_revoked => {
                token.revoke(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_user_tokens(&self, identity_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens.values_mut() {
            if token.identity_id == identity_id && !token.is_revoked {
                token.revoke(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_token_family(&self, family_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens.values_mut() {
            if token.family_id == family_id && !token.is_revoked {
                token.revoke(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before - tokens.len())
    }
}
