//! Sign Out Use Case
//!
//! Soft-invalidates a user's session. The record stays in the store with
//! its validity flag flipped; retention sweeps delete it eventually.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_service::TokenService;
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::UserId;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S>
where
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    tokens: TokenService<S>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(sessions: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            tokens: TokenService::new(sessions, config),
        }
    }

    /// Sign out from the current session
    pub async fn execute(&self, user_id: &UserId) -> AuthResult<()> {
        self.tokens.invalidate(user_id).await?;

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Sign out from every device
    pub async fn execute_all(&self, user_id: &UserId) -> AuthResult<u64> {
        let invalidated = self.tokens.invalidate_all(user_id).await?;

        tracing::info!(
            user_id = %user_id,
            invalidated = invalidated,
            "User signed out from all devices"
        );

        Ok(invalidated)
    }
}
