//! Sign In Use Case
//!
//! Gates the attempt through the limiter, checks credentials through the
//! configured strategy, then issues a token pair and upserts the session.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::{AuthConfig, VerifierStrategy};
use crate::application::login_limiter::{LockState, LoginLimiter};
use crate::application::token_service::TokenService;
use crate::domain::entity::SessionRecord;
use crate::domain::repository::{
    CredentialVerifier, LoginAttemptRepository, PrincipalRepository, SessionRepository,
};
use crate::domain::value_object::{IdentityKey, LoginMethod, OutletId, UserId};
use crate::error::{AuthError, AuthResult};

/// Re-export ClientInfo from platform
pub use platform::client::ClientInfo;

/// Sign in input
pub struct SignInInput {
    /// Login email
    pub email: String,
    /// Password
    pub password: String,
    /// Remember me flag
    pub remember_me: bool,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user_id: UserId,
    pub outlet_id: OutletId,
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Sign in use case
pub struct SignInUseCase<P, S, A, V>
where
    P: PrincipalRepository + Clone + Send + Sync + 'static,
    S: SessionRepository + Clone + Send + Sync + 'static,
    A: LoginAttemptRepository + Clone + Send + Sync + 'static,
    V: CredentialVerifier + Send + Sync + 'static,
{
    principals: Arc<P>,
    sessions: Arc<S>,
    tokens: TokenService<S>,
    limiter: LoginLimiter<A>,
    verifier: Arc<V>,
    config: Arc<AuthConfig>,
}

impl<P, S, A, V> SignInUseCase<P, S, A, V>
where
    P: PrincipalRepository + Clone + Send + Sync + 'static,
    S: SessionRepository + Clone + Send + Sync + 'static,
    A: LoginAttemptRepository + Clone + Send + Sync + 'static,
    V: CredentialVerifier + Send + Sync + 'static,
{
    pub fn new(
        principals: Arc<P>,
        sessions: Arc<S>,
        attempts: Arc<A>,
        verifier: Arc<V>,
        config: Arc<AuthConfig>,
    ) -> Self {
        let tokens = TokenService::new(sessions.clone(), config.clone());
        let limiter = LoginLimiter::new(attempts, config.clone());

        Self {
            principals,
            sessions,
            tokens,
            limiter,
            verifier,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: ClientInfo,
    ) -> AuthResult<SignInOutput> {
        let key = IdentityKey::new(&input.email).map_err(|_| AuthError::InvalidCredentials {
            remaining_attempts: None,
        })?;

        // Lockout gate before anything touches credentials
        if let LockState::Locked { retry_after } = self.limiter.check(&key).await? {
            return Err(AuthError::AccountLocked { retry_after });
        }

        let Some(principal) = self.principals.find_by_identity_key(&key).await? else {
            return Err(self.record_failure(&key, &client).await?);
        };

        let verified = match self
            .verifier
            .verify(&key, &input.password, principal.password_hash.as_deref())
            .await
        {
            Ok(ok) => ok,
            Err(e) => {
                // Technical verifier failures stay in the logs; the caller
                // only ever sees a generic authentication failure
                tracing::warn!(error = %e, identity_key = %key, "Credential verifier error");
                false
            }
        };

        if !verified {
            return Err(self.record_failure(&key, &client).await?);
        }

        if !principal.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        self.limiter.record(&key, client.ip_string(), true).await?;

        let issued = self
            .tokens
            .issue(&principal.user_id, principal.outlet_id, input.remember_me)?;

        let session = SessionRecord::new(
            principal.user_id.clone(),
            principal.outlet_id,
            issued.access_token.clone(),
            issued.refresh_token.clone(),
            issued.refresh_expires_at,
            input.remember_me,
            self.login_method(),
            client.ip_string(),
            client.user_agent.clone(),
        );

        self.sessions.upsert(&session).await?;

        tracing::info!(
            user_id = %principal.user_id,
            outlet_id = %principal.outlet_id,
            remember_me = input.remember_me,
            method = %session.login_method,
            "User signed in"
        );

        Ok(SignInOutput {
            user_id: principal.user_id,
            outlet_id: principal.outlet_id,
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            refresh_expires_at: issued.refresh_expires_at,
        })
    }

    /// Record a failed attempt and build the client-facing error.
    ///
    /// Exhausting the last attempt reports the lockout immediately instead
    /// of a remaining count of zero.
    async fn record_failure(&self, key: &IdentityKey, client: &ClientInfo) -> AuthResult<AuthError> {
        self.limiter.record(key, client.ip_string(), false).await?;

        let remaining = self.limiter.remaining_attempts(key).await?;
        if remaining == 0 {
            return Ok(AuthError::AccountLocked {
                retry_after: self.config.lockout_duration,
            });
        }

        Ok(AuthError::InvalidCredentials {
            remaining_attempts: Some(remaining),
        })
    }

    fn login_method(&self) -> LoginMethod {
        match self.config.verifier {
            VerifierStrategy::PasswordHash => LoginMethod::Password,
            VerifierStrategy::DirectoryBind { .. } => LoginMethod::Directory,
        }
    }

    #[cfg(test)]
    pub fn limiter(&self) -> &LoginLimiter<A> {
        &self.limiter
    }
}
