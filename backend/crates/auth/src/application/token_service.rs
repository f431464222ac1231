//! Token Service
//!
//! Orchestrates issuance, validation, rotation, and invalidation of the
//! access/refresh token pair. Every other component calls into this one.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::application::config::AuthConfig;
use crate::domain::claims::ClaimsSigner;
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::{OutletId, UserId};
use crate::error::{AuthError, AuthResult};
use platform::crypto::{self, TransportCipher, constant_time_eq};

/// Entropy of the refresh secret before sealing (bytes)
const REFRESH_SECRET_LEN: usize = 32;

/// Result of an issuance: both tokens plus the refresh expiry the caller
/// must persist on the session record.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Token issuance/validation service
#[derive(Clone)]
pub struct TokenService<S>
where
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    sessions: Arc<S>,
    config: Arc<AuthConfig>,
    signer: ClaimsSigner,
    cipher: TransportCipher,
}

impl<S> TokenService<S>
where
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(sessions: Arc<S>, config: Arc<AuthConfig>) -> Self {
        let signer = ClaimsSigner::new(&config.signing_secret, config.issuer.clone());
        let cipher = TransportCipher::new(&config.transport_key);

        Self {
            sessions,
            config,
            signer,
            cipher,
        }
    }

    fn access_lifetime(&self) -> AuthResult<Duration> {
        Duration::from_std(self.config.access_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid access token TTL: {e}")))
    }

    /// Issue a fresh token pair for an identity.
    ///
    /// The caller persists the resulting session record; this method does
    /// not touch the store.
    pub fn issue(
        &self,
        user_id: &UserId,
        outlet_id: OutletId,
        remember_me: bool,
    ) -> AuthResult<IssuedTokens> {
        let access_token = self.signer.sign(user_id, outlet_id, self.access_lifetime()?)?;

        // High-entropy secret, sealed so the client-held string has no
        // recognizable structure. Comparison stays byte-for-byte on the blob.
        let secret = crypto::random_bytes(REFRESH_SECRET_LEN);
        let sealed = self.cipher.seal(crypto::to_base64(&secret).as_bytes())?;
        let refresh_token = crypto::to_base64(&sealed);

        let refresh_lifetime = Duration::from_std(self.config.refresh_ttl(remember_me))
            .map_err(|e| AuthError::Internal(format!("Invalid refresh token TTL: {e}")))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            refresh_expires_at: Utc::now() + refresh_lifetime,
        })
    }

    /// Validate an access token against its claims and its session.
    ///
    /// A verified signature is necessary but not sufficient: the session
    /// must exist, be valid, and still carry this exact token. All three
    /// failure modes collapse into one 401 externally.
    pub async fn validate(&self, token: &str) -> AuthResult<(UserId, OutletId)> {
        let claims = self.signer.verify(token)?;
        let user_id = claims.user_id();

        let session = self
            .sessions
            .find_by_user_id(&user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_valid {
            return Err(AuthError::SessionRevoked);
        }

        if !constant_time_eq(session.access_token.as_bytes(), token.as_bytes()) {
            // A rotation elsewhere replaced this token
            return Err(AuthError::SessionMismatch);
        }

        Ok((user_id, claims.outlet_id()))
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The refresh token itself is not rotated here; it is only reissued on
    /// full re-login. Past its expiry, remember-me sessions are silently
    /// extended by one more lifetime, others must re-authenticate.
    pub async fn rotate(&self, user_id: &UserId, presented_refresh: &str) -> AuthResult<String> {
        let session = self
            .sessions
            .find_by_user_id(user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_valid {
            return Err(AuthError::SessionRevoked);
        }

        if !constant_time_eq(
            session.refresh_token.as_bytes(),
            presented_refresh.as_bytes(),
        ) {
            return Err(AuthError::SessionMismatch);
        }

        let now = Utc::now();
        if session.refresh_expires_at < now {
            if !session.remember_me {
                return Err(AuthError::RefreshExpired);
            }

            let lifetime = Duration::from_std(self.config.refresh_token_ttl_remember)
                .map_err(|e| AuthError::Internal(format!("Invalid refresh token TTL: {e}")))?;
            self.sessions
                .extend_refresh_expiry(user_id, now + lifetime)
                .await?;

            tracing::debug!(user_id = %user_id, "Extended remember-me refresh expiry");
        }

        let new_access = self
            .signer
            .sign(user_id, session.outlet_id, self.access_lifetime()?)?;

        // Persisting the new token is what retires the old one: the next
        // validate on it fails with a mismatch
        self.sessions.set_access_token(user_id, &new_access).await?;

        tracing::info!(user_id = %user_id, "Access token rotated");

        Ok(new_access)
    }

    /// Invalidate the identity's session (logout).
    pub async fn invalidate(&self, user_id: &UserId) -> AuthResult<()> {
        let matched = self.sessions.invalidate(user_id).await?;
        if !matched {
            return Err(AuthError::SessionNotFound);
        }

        tracing::info!(user_id = %user_id, "Session invalidated");
        Ok(())
    }

    /// Invalidate every session for the identity (logout everywhere).
    pub async fn invalidate_all(&self, user_id: &UserId) -> AuthResult<u64> {
        let count = self.sessions.invalidate_all(user_id).await?;

        tracing::info!(user_id = %user_id, sessions = count, "All sessions invalidated");
        Ok(count)
    }
}
