//! Repository Traits
//!
//! Ports to the external stores. Implementations live in the
//! infrastructure layer; tests substitute in-memory versions.
//!
//! Both stores must provide read-your-writes consistency per identity key.
//! No trait method blocks indefinitely; adapters bound every call with a
//! short timeout so a store outage degrades to fast failures.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entity::{LoginAttempt, Principal, SessionRecord};
use crate::domain::value_object::{IdentityKey, UserId};
use crate::error::AuthResult;

/// Session store port (document-store style, keyed by identity).
///
/// Single-slot policy: `upsert` replaces in place, so at most one
/// authoritative record exists per identity. Two concurrent logins race to
/// overwrite; last writer wins and the earlier login's access token then
/// fails validation with a mismatch.
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Insert or replace the record for the session's identity
    async fn upsert(&self, session: &SessionRecord) -> AuthResult<()>;

    /// Find the record for an identity
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<SessionRecord>>;

    /// Find the valid record matching an identity and refresh token
    async fn find_by_refresh_token(
        &self,
        user_id: &UserId,
        refresh_token: &str,
    ) -> AuthResult<Option<SessionRecord>>;

    /// Replace the stored access token (rotation)
    async fn set_access_token(&self, user_id: &UserId, access_token: &str) -> AuthResult<()>;

    /// Push the refresh expiry forward (remember-me extension)
    async fn extend_refresh_expiry(
        &self,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Flip the validity flag; returns whether a record was matched
    async fn invalidate(&self, user_id: &UserId) -> AuthResult<bool>;

    /// Flip the validity flag on every record for the identity.
    ///
    /// Identical to `invalidate` under the single-slot policy; kept
    /// distinct for the per-device keying variant.
    async fn invalidate_all(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Currently valid records for an identity (session listing)
    async fn find_active(&self, user_id: &UserId) -> AuthResult<Vec<SessionRecord>>;
}

/// Login attempt store port (relational, append-only).
#[trait_variant::make(LoginAttemptRepository: Send)]
pub trait LocalLoginAttemptRepository {
    /// Append an attempt record
    async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()>;

    /// Count failed attempts for a key since the given instant
    async fn count_failures_since(
        &self,
        key: &IdentityKey,
        since: DateTime<Utc>,
    ) -> AuthResult<i64>;

    /// Timestamp of the most recent failed attempt, if any
    async fn most_recent_failure(&self, key: &IdentityKey) -> AuthResult<Option<DateTime<Utc>>>;

    /// Delete failed attempt records for a key (administrative unlock)
    async fn clear_failures(&self, key: &IdentityKey) -> AuthResult<u64>;
}

/// Read-only port to the externally managed user records.
#[trait_variant::make(PrincipalRepository: Send)]
pub trait LocalPrincipalRepository {
    /// Look up a principal by normalized login handle
    async fn find_by_identity_key(&self, key: &IdentityKey) -> AuthResult<Option<Principal>>;
}

/// Technical failures inside a credential check strategy.
///
/// These are logged with context and surfaced to callers as a generic
/// authentication failure, never as their own response.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Directory bind request failed: {0}")]
    Directory(String),

    #[error("Stored credential hash is malformed")]
    BadStoredHash,
}

/// Credential check capability.
///
/// Two interchangeable strategies: local password hash comparison, or
/// delegation to an external directory bind. Both are black boxes to the
/// sign-in flow, returning only allow/deny plus an optional technical
/// error.
#[trait_variant::make(CredentialVerifier: Send)]
pub trait LocalCredentialVerifier {
    /// Check `supplied` against the identity's credential.
    ///
    /// `stored_hash` is the principal's password hash when one exists; the
    /// directory strategy ignores it.
    async fn verify(
        &self,
        handle: &IdentityKey,
        supplied: &str,
        stored_hash: Option<&str>,
    ) -> Result<bool, VerifierError>;
}
