//! Refresh Access Token Use Case
//!
//! Exchanges a valid refresh token for a fresh access token. The refresh
//! token itself is only reissued on full re-login.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_service::TokenService;
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::UserId;
use crate::error::AuthResult;

/// Refresh input
pub struct RefreshInput {
    pub user_id: String,
    pub refresh_token: String,
}

/// Refresh output
pub struct RefreshOutput {
    pub access_token: String,
}

/// Refresh use case
pub struct RefreshAccessUseCase<S>
where
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    tokens: TokenService<S>,
}

impl<S> RefreshAccessUseCase<S>
where
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(sessions: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            tokens: TokenService::new(sessions, config),
        }
    }

    pub async fn execute(&self, input: RefreshInput) -> AuthResult<RefreshOutput> {
        let user_id = UserId::new(input.user_id);

        let access_token = self.tokens.rotate(&user_id, &input.refresh_token).await?;

        Ok(RefreshOutput { access_token })
    }
}
