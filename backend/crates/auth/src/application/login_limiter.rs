//! Login Attempt Limiter
//!
//! Sliding-window lockout evaluated lazily on each attempt; no background
//! timers and no explicit unlock transition. Once the most recent failure
//! falls out of lockout range the window self-clears.
//!
//! The count-then-decide-then-append sequence is not transactional. Under
//! concurrent attack traffic a few extra attempts can slip through at the
//! lockout boundary; a false negative in a best-effort limiter, accepted.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::LoginAttempt;
use crate::domain::repository::LoginAttemptRepository;
use crate::domain::value_object::IdentityKey;
use crate::error::{AuthError, AuthResult};

/// Lockout decision for one identity key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// Attempts allowed
    Open { recent_failures: u32 },
    /// Attempts rejected until the lock expires
    Locked { retry_after: StdDuration },
}

/// Per-identity sliding-window limiter
#[derive(Clone)]
pub struct LoginLimiter<A>
where
    A: LoginAttemptRepository + Clone + Send + Sync + 'static,
{
    attempts: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A> LoginLimiter<A>
where
    A: LoginAttemptRepository + Clone + Send + Sync + 'static,
{
    pub fn new(attempts: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { attempts, config }
    }

    fn window(&self) -> AuthResult<Duration> {
        Duration::from_std(self.config.attempt_window)
            .map_err(|e| AuthError::Internal(format!("Invalid attempt window: {e}")))
    }

    fn lockout(&self) -> AuthResult<Duration> {
        Duration::from_std(self.config.lockout_duration)
            .map_err(|e| AuthError::Internal(format!("Invalid lockout duration: {e}")))
    }

    /// Evaluate the lock state for an identity key.
    ///
    /// Counts failures already recorded; the attempt being gated is not
    /// among them, so the threshold-th attempt itself is still admitted.
    pub async fn check(&self, key: &IdentityKey) -> AuthResult<LockState> {
        let since = Utc::now() - self.window()?;
        let failures = self.attempts.count_failures_since(key, since).await?;
        let failures = u32::try_from(failures.max(0)).unwrap_or(u32::MAX);

        if failures < self.config.attempt_threshold {
            return Ok(LockState::Open {
                recent_failures: failures,
            });
        }

        let Some(last_failure) = self.attempts.most_recent_failure(key).await? else {
            return Ok(LockState::Open {
                recent_failures: failures,
            });
        };

        let lock_expiry = last_failure + self.lockout()?;
        let now = Utc::now();

        if now < lock_expiry {
            let retry_after = (lock_expiry - now).to_std().unwrap_or_default();
            return Ok(LockState::Locked { retry_after });
        }

        Ok(LockState::Open {
            recent_failures: failures,
        })
    }

    /// Append an attempt record.
    ///
    /// Success does not purge prior failures; the window decay handles
    /// that.
    pub async fn record(
        &self,
        key: &IdentityKey,
        source_ip: Option<String>,
        succeeded: bool,
    ) -> AuthResult<()> {
        let attempt = LoginAttempt::new(key.clone(), source_ip, succeeded);
        self.attempts.append(&attempt).await
    }

    /// Attempts left in the current window before lockout.
    pub async fn remaining_attempts(&self, key: &IdentityKey) -> AuthResult<u32> {
        let since = Utc::now() - self.window()?;
        let failures = self.attempts.count_failures_since(key, since).await?;
        let failures = u32::try_from(failures.max(0)).unwrap_or(u32::MAX);

        Ok(self.config.attempt_threshold.saturating_sub(failures))
    }

    /// Administrative unlock: delete the identity's failed attempt records.
    pub async fn unlock(&self, key: &IdentityKey) -> AuthResult<u64> {
        let cleared = self.attempts.clear_failures(key).await?;

        tracing::info!(identity_key = %key, cleared = cleared, "Account unlocked by administrator");
        Ok(cleared)
    }
}
