use crate::models::{Credentials, IssueTokenError, Principal, ResolveTokenError, Token};
use crate::repositories::{TokenRepository, UserRepository};
use std::sync::Arc;

/// Exchanges credentials for bearer tokens and maps tokens back to principals.
///
/// Tokens never expire; a principal keeps the same key until its row is removed.
#[derive(Clone)]
pub struct TokenStore {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl TokenStore {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self { users, tokens }
    }

    pub async fn issue(&self, credentials: &Credentials) -> Result<Token, IssueTokenError> {
        let principal = self
            .users
            .verify_credentials(credentials)
            .await
            .inspect_err(|err| {
                tracing::debug!(username = credentials.username(), %err, "token exchange refused");
            })?;

        let token = self.tokens.find_or_create_token(&principal).await?;
        tracing::debug!(username = principal.username(), "token issued");
        Ok(token)
    }

    pub async fn resolve(&self, key: &str) -> Result<Principal, ResolveTokenError> {
        self.tokens.find_principal(key).await
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
