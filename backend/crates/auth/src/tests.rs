//! Unit tests for the session lifecycle, token rotation, and login limiter.
//!
//! Runs against in-memory repositories so the full issue/validate/rotate
//! state machine is exercised without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::application::config::AuthConfig;
use crate::application::login_limiter::{LockState, LoginLimiter};
use crate::application::sign_in::{SignInInput, SignInUseCase};
use crate::application::token_service::TokenService;
use crate::domain::claims::ClaimsSigner;
use crate::domain::entity::{LoginAttempt, Principal, SessionRecord};
use crate::domain::repository::{
    LoginAttemptRepository, PrincipalRepository, SessionRepository,
};
use crate::domain::value_object::{IdentityKey, LoginMethod, OutletId, UserId};
use crate::error::{AuthError, AuthResult};
use crate::infra::verifier::PasswordHashVerifier;
use platform::client::ClientInfo;
use platform::password::ClearTextPassword;

// ============================================================================
// In-memory repositories
// ============================================================================

#[derive(Clone, Default)]
struct MemoryStore {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
    attempts: Arc<Mutex<Vec<LoginAttempt>>>,
    principals: Arc<Mutex<HashMap<String, Principal>>>,
}

impl MemoryStore {
    fn insert_principal(&self, principal: Principal) {
        self.principals
            .lock()
            .unwrap()
            .insert(principal.identity_key.as_str().to_string(), principal);
    }

    fn push_attempt(&self, attempt: LoginAttempt) {
        self.attempts.lock().unwrap().push(attempt);
    }

    fn session(&self, user_id: &UserId) -> Option<SessionRecord> {
        self.sessions.lock().unwrap().get(user_id.as_str()).cloned()
    }
}

impl SessionRepository for MemoryStore {
    async fn upsert(&self, session: &SessionRecord) -> AuthResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id.as_str().to_string(), session.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<SessionRecord>> {
        Ok(self.session(user_id))
    }

    async fn find_by_refresh_token(
        &self,
        user_id: &UserId,
        refresh_token: &str,
    ) -> AuthResult<Option<SessionRecord>> {
        Ok(self
            .session(user_id)
            .filter(|s| s.is_valid && s.refresh_token == refresh_token))
    }

    async fn set_access_token(&self, user_id: &UserId, access_token: &str) -> AuthResult<()> {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(user_id.as_str()) {
            if session.is_valid {
                session.replace_access_token(access_token.to_string());
            }
        }
        Ok(())
    }

    async fn extend_refresh_expiry(
        &self,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(user_id.as_str()) {
            if session.is_valid {
                session.refresh_expires_at = expires_at;
                session.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn invalidate(&self, user_id: &UserId) -> AuthResult<bool> {
        match self.sessions.lock().unwrap().get_mut(user_id.as_str()) {
            Some(session) => {
                session.invalidate();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn invalidate_all(&self, user_id: &UserId) -> AuthResult<u64> {
        match self.sessions.lock().unwrap().get_mut(user_id.as_str()) {
            Some(session) => {
                session.invalidate();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_active(&self, user_id: &UserId) -> AuthResult<Vec<SessionRecord>> {
        Ok(self.session(user_id).filter(|s| s.is_valid).into_iter().collect())
    }
}

impl LoginAttemptRepository for MemoryStore {
    async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()> {
        self.push_attempt(attempt.clone());
        Ok(())
    }

    async fn count_failures_since(
        &self,
        key: &IdentityKey,
        since: DateTime<Utc>,
    ) -> AuthResult<i64> {
        let count = self
            .attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.identity_key == *key && !a.succeeded && a.attempted_at > since)
            .count();
        Ok(count as i64)
    }

    async fn most_recent_failure(&self, key: &IdentityKey) -> AuthResult<Option<DateTime<Utc>>> {
        Ok(self
            .attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.identity_key == *key && !a.succeeded)
            .map(|a| a.attempted_at)
            .max())
    }

    async fn clear_failures(&self, key: &IdentityKey) -> AuthResult<u64> {
        let mut attempts = self.attempts.lock().unwrap();
        let before = attempts.len();
        attempts.retain(|a| a.identity_key != *key || a.succeeded);
        Ok((before - attempts.len()) as u64)
    }
}

impl PrincipalRepository for MemoryStore {
    async fn find_by_identity_key(&self, key: &IdentityKey) -> AuthResult<Option<Principal>> {
        Ok(self.principals.lock().unwrap().get(key.as_str()).cloned())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::with_random_secrets())
}

fn token_service(store: &MemoryStore, config: Arc<AuthConfig>) -> TokenService<MemoryStore> {
    TokenService::new(Arc::new(store.clone()), config)
}

async fn seed_session(
    service: &TokenService<MemoryStore>,
    store: &MemoryStore,
    user_id: &str,
    outlet: i64,
    remember_me: bool,
) -> (UserId, String, String) {
    let user = UserId::new(user_id);
    let outlet = OutletId::new(outlet);

    let issued = service.issue(&user, outlet, remember_me).unwrap();

    let record = SessionRecord::new(
        user.clone(),
        outlet,
        issued.access_token.clone(),
        issued.refresh_token.clone(),
        issued.refresh_expires_at,
        remember_me,
        LoginMethod::Password,
        Some("127.0.0.1".to_string()),
        Some("test-agent".to_string()),
    );
    store.upsert(&record).await.unwrap();

    (user, issued.access_token, issued.refresh_token)
}

fn key(email: &str) -> IdentityKey {
    IdentityKey::new(email).unwrap()
}

fn failed_attempt_at(email: &str, at: DateTime<Utc>) -> LoginAttempt {
    LoginAttempt {
        identity_key: key(email),
        source_ip: Some("10.0.0.1".to_string()),
        attempted_at: at,
        succeeded: false,
    }
}

// ============================================================================
// Token service: issue / validate
// ============================================================================

#[tokio::test]
async fn issue_then_validate_returns_same_identity() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (user, access, _) = seed_session(&svc, &store, "u1", 7, false).await;

    let (validated_user, validated_outlet) = svc.validate(&access).await.unwrap();
    assert_eq!(validated_user, user);
    assert_eq!(validated_outlet, OutletId::new(7));
}

#[tokio::test]
async fn validate_rejects_expired_claims_even_with_matching_session() {
    let store = MemoryStore::default();
    let cfg = config();
    let svc = token_service(&store, cfg.clone());

    // Token whose claims are already past expiry, stored as the session's
    // current access token
    let signer = ClaimsSigner::new(&cfg.signing_secret, cfg.issuer.clone());
    let user = UserId::new("u1");
    let stale = signer
        .sign(&user, OutletId::new(7), Duration::hours(-1))
        .unwrap();

    let record = SessionRecord::new(
        user,
        OutletId::new(7),
        stale.clone(),
        "refresh-blob".to_string(),
        Utc::now() + Duration::days(7),
        false,
        LoginMethod::Password,
        None,
        None,
    );
    store.upsert(&record).await.unwrap();

    assert!(matches!(
        svc.validate(&stale).await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn validate_rejects_token_without_session() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let issued = svc.issue(&UserId::new("ghost"), OutletId::NONE, false).unwrap();

    assert!(matches!(
        svc.validate(&issued.access_token).await,
        Err(AuthError::SessionNotFound)
    ));
}

// ============================================================================
// Token service: rotate
// ============================================================================

#[tokio::test]
async fn rotate_retires_previous_access_token() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (user, old_access, refresh) = seed_session(&svc, &store, "u1", 7, false).await;

    let new_access = svc.rotate(&user, &refresh).await.unwrap();
    assert_ne!(new_access, old_access);

    // Old token now fails with a revocation-class error, new one passes
    assert!(matches!(
        svc.validate(&old_access).await,
        Err(AuthError::SessionMismatch)
    ));
    assert!(svc.validate(&new_access).await.is_ok());
}

#[tokio::test]
async fn rotate_rejects_mismatched_refresh_token() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (user, _, _) = seed_session(&svc, &store, "u1", 7, false).await;

    assert!(matches!(
        svc.rotate(&user, "not-the-stored-token").await,
        Err(AuthError::SessionMismatch)
    ));
}

#[tokio::test]
async fn find_by_refresh_token_requires_match_and_validity() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (user, _, refresh) = seed_session(&svc, &store, "u1", 7, false).await;

    assert!(
        store
            .find_by_refresh_token(&user, &refresh)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        store
            .find_by_refresh_token(&user, "some-other-token")
            .await
            .unwrap()
            .is_none()
    );

    svc.invalidate(&user).await.unwrap();
    assert!(
        store
            .find_by_refresh_token(&user, &refresh)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn rotate_rejects_unknown_identity() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    assert!(matches!(
        svc.rotate(&UserId::new("ghost"), "whatever").await,
        Err(AuthError::SessionNotFound)
    ));
}

#[tokio::test]
async fn rotate_fails_past_expiry_without_remember_me() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (user, _, refresh) = seed_session(&svc, &store, "u1", 7, false).await;

    let expired_at = Utc::now() - Duration::hours(1);
    store
        .sessions
        .lock()
        .unwrap()
        .get_mut("u1")
        .unwrap()
        .refresh_expires_at = expired_at;

    assert!(matches!(
        svc.rotate(&user, &refresh).await,
        Err(AuthError::RefreshExpired)
    ));

    // Expiry was not silently extended
    assert_eq!(store.session(&user).unwrap().refresh_expires_at, expired_at);
}

#[tokio::test]
async fn rotate_extends_expiry_with_remember_me() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (user, _, refresh) = seed_session(&svc, &store, "u1", 7, true).await;

    store
        .sessions
        .lock()
        .unwrap()
        .get_mut("u1")
        .unwrap()
        .refresh_expires_at = Utc::now() - Duration::hours(1);

    let new_access = svc.rotate(&user, &refresh).await.unwrap();
    assert!(svc.validate(&new_access).await.is_ok());

    // Pushed forward by one full remember-me lifetime from now
    let stored = store.session(&user).unwrap();
    assert!(stored.refresh_expires_at > Utc::now() + Duration::days(29));
}

// ============================================================================
// Token service: invalidate
// ============================================================================

#[tokio::test]
async fn invalidate_blocks_validation_without_affecting_others() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (u1, u1_access, _) = seed_session(&svc, &store, "u1", 7, false).await;
    let (_, u2_access, _) = seed_session(&svc, &store, "u2", 8, false).await;

    svc.invalidate(&u1).await.unwrap();

    assert!(matches!(
        svc.validate(&u1_access).await,
        Err(AuthError::SessionRevoked)
    ));
    assert!(svc.validate(&u2_access).await.is_ok());
}

#[tokio::test]
async fn invalidate_unknown_identity_reports_not_found() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    assert!(matches!(
        svc.invalidate(&UserId::new("ghost")).await,
        Err(AuthError::SessionNotFound)
    ));
}

#[tokio::test]
async fn last_login_wins_overwrite_retires_earlier_session() {
    let store = MemoryStore::default();
    let svc = token_service(&store, config());

    let (_, first_access, _) = seed_session(&svc, &store, "u1", 7, false).await;
    let (_, second_access, _) = seed_session(&svc, &store, "u1", 7, false).await;

    assert!(matches!(
        svc.validate(&first_access).await,
        Err(AuthError::SessionMismatch)
    ));
    assert!(svc.validate(&second_access).await.is_ok());
}

// ============================================================================
// Login limiter
// ============================================================================

#[tokio::test]
async fn limiter_admits_attempt_below_threshold() {
    let store = MemoryStore::default();
    let limiter = LoginLimiter::new(Arc::new(store.clone()), config());

    // Four recorded failures: the fifth attempt's own gate-check still passes
    for _ in 0..4 {
        store.push_attempt(failed_attempt_at("owner@example.com", Utc::now()));
    }

    assert_eq!(
        limiter.check(&key("owner@example.com")).await.unwrap(),
        LockState::Open { recent_failures: 4 }
    );
}

#[tokio::test]
async fn limiter_locks_at_threshold_with_remaining_duration() {
    let store = MemoryStore::default();
    let limiter = LoginLimiter::new(Arc::new(store.clone()), config());

    for _ in 0..5 {
        store.push_attempt(failed_attempt_at("owner@example.com", Utc::now()));
    }

    match limiter.check(&key("owner@example.com")).await.unwrap() {
        LockState::Locked { retry_after } => {
            // lockout_duration minus (now - last failure), which is ~0 here
            assert!(retry_after.as_secs() > 295 && retry_after.as_secs() <= 300);
        }
        other => panic!("expected Locked, got {other:?}"),
    }
}

#[tokio::test]
async fn limiter_self_clears_after_lockout_duration() {
    let store = MemoryStore::default();
    let limiter = LoginLimiter::new(Arc::new(store.clone()), config());

    // Five failures, all older than the lockout but inside the window
    let at = Utc::now() - Duration::minutes(6);
    for _ in 0..5 {
        store.push_attempt(failed_attempt_at("owner@example.com", at));
    }

    assert!(matches!(
        limiter.check(&key("owner@example.com")).await.unwrap(),
        LockState::Open { recent_failures: 5 }
    ));
}

#[tokio::test]
async fn limiter_window_decay_forgets_old_failures() {
    let store = MemoryStore::default();
    let limiter = LoginLimiter::new(Arc::new(store.clone()), config());

    let at = Utc::now() - Duration::minutes(16);
    for _ in 0..5 {
        store.push_attempt(failed_attempt_at("owner@example.com", at));
    }

    assert_eq!(
        limiter.check(&key("owner@example.com")).await.unwrap(),
        LockState::Open { recent_failures: 0 }
    );
    assert_eq!(
        limiter.remaining_attempts(&key("owner@example.com")).await.unwrap(),
        5
    );
}

#[tokio::test]
async fn limiter_success_does_not_purge_failures() {
    let store = MemoryStore::default();
    let limiter = LoginLimiter::new(Arc::new(store.clone()), config());
    let k = key("owner@example.com");

    for _ in 0..3 {
        limiter.record(&k, None, false).await.unwrap();
    }
    limiter.record(&k, None, true).await.unwrap();

    assert_eq!(
        limiter.check(&k).await.unwrap(),
        LockState::Open { recent_failures: 3 }
    );
    assert_eq!(limiter.remaining_attempts(&k).await.unwrap(), 2);
}

#[tokio::test]
async fn limiter_unlock_clears_failed_records_only() {
    let store = MemoryStore::default();
    let limiter = LoginLimiter::new(Arc::new(store.clone()), config());
    let k = key("owner@example.com");

    for _ in 0..5 {
        limiter.record(&k, None, false).await.unwrap();
    }
    limiter.record(&k, None, true).await.unwrap();

    let cleared = limiter.unlock(&k).await.unwrap();
    assert_eq!(cleared, 5);

    assert_eq!(
        limiter.check(&k).await.unwrap(),
        LockState::Open { recent_failures: 0 }
    );
    // The successful attempt record stays
    assert_eq!(store.attempts.lock().unwrap().len(), 1);
}

// ============================================================================
// Sign-in scenarios
// ============================================================================

fn seed_principal(store: &MemoryStore, email: &str, password: &str, active: bool) -> UserId {
    let hashed = ClearTextPassword::new(password.to_string())
        .unwrap()
        .hash(None)
        .unwrap();

    let user_id = UserId::new("u1");
    store.insert_principal(Principal {
        user_id: user_id.clone(),
        identity_key: key(email),
        outlet_id: OutletId::new(7),
        password_hash: Some(hashed.as_phc_string().to_string()),
        is_active: active,
    });
    user_id
}

fn sign_in_use_case(
    store: &MemoryStore,
    config: Arc<AuthConfig>,
) -> SignInUseCase<MemoryStore, MemoryStore, MemoryStore, PasswordHashVerifier> {
    SignInUseCase::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(PasswordHashVerifier::new(None)),
        config,
    )
}

fn client() -> ClientInfo {
    ClientInfo::new(Some("10.0.0.1".parse().unwrap()), Some("test-agent".to_string()))
}

fn login(email: &str, password: &str) -> SignInInput {
    SignInInput {
        email: email.to_string(),
        password: password.to_string(),
        remember_me: false,
    }
}

#[tokio::test]
async fn sign_in_success_issues_validating_session() {
    let store = MemoryStore::default();
    let cfg = config();
    let user = seed_principal(&store, "owner@example.com", "correct horse battery", true);

    let use_case = sign_in_use_case(&store, cfg.clone());
    let output = use_case
        .execute(login("Owner@Example.com ", "correct horse battery"), client())
        .await
        .unwrap();

    assert_eq!(output.user_id, user);
    assert_eq!(output.outlet_id, OutletId::new(7));

    let stored = store.session(&user).unwrap();
    assert!(stored.is_valid);
    assert_eq!(stored.last_ip, Some("10.0.0.1".to_string()));
    assert_eq!(stored.login_method, LoginMethod::Password);

    let svc = token_service(&store, cfg);
    assert!(svc.validate(&output.access_token).await.is_ok());
}

#[tokio::test]
async fn sign_in_wrong_password_reports_remaining_attempts() {
    let store = MemoryStore::default();
    seed_principal(&store, "owner@example.com", "correct horse battery", true);

    let use_case = sign_in_use_case(&store, config());

    let err = use_case
        .execute(login("owner@example.com", "wrong password!"), client())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuthError::InvalidCredentials {
            remaining_attempts: Some(4)
        }
    ));
}

#[tokio::test]
async fn sign_in_lockout_scenario() {
    let store = MemoryStore::default();
    let cfg = config();
    seed_principal(&store, "owner@example.com", "correct horse battery", true);

    let use_case = sign_in_use_case(&store, cfg.clone());

    // Four failures leave a shrinking budget
    for expected_remaining in [4u32, 3, 2, 1] {
        let err = use_case
            .execute(login("owner@example.com", "wrong password!"), client())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidCredentials { remaining_attempts: Some(r) } if r == expected_remaining
        ));
    }

    // Fifth failure exhausts the budget and reports the lockout directly
    let err = use_case
        .execute(login("owner@example.com", "wrong password!"), client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked { .. }));

    // Even correct credentials are rejected while locked
    let err = use_case
        .execute(login("owner@example.com", "correct horse battery"), client())
        .await
        .unwrap_err();
    match err {
        AuthError::AccountLocked { retry_after } => {
            assert!(retry_after.as_secs() <= cfg.lockout_duration.as_secs());
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }
}

#[tokio::test]
async fn sign_in_after_lockout_expiry_succeeds() {
    let store = MemoryStore::default();
    seed_principal(&store, "owner@example.com", "correct horse battery", true);

    // A lockout whose last failure is older than the lockout duration
    let at = Utc::now() - Duration::minutes(6);
    for _ in 0..5 {
        store.push_attempt(failed_attempt_at("owner@example.com", at));
    }

    let use_case = sign_in_use_case(&store, config());
    let output = use_case
        .execute(login("owner@example.com", "correct horse battery"), client())
        .await
        .unwrap();

    assert!(store.session(&output.user_id).unwrap().is_valid);
}

#[tokio::test]
async fn sign_in_unknown_identity_is_generic_failure() {
    let store = MemoryStore::default();
    let use_case = sign_in_use_case(&store, config());

    let err = use_case
        .execute(login("nobody@example.com", "whatever12345"), client())
        .await
        .unwrap_err();

    // Indistinguishable from a wrong password, and still counted
    assert!(matches!(err, AuthError::InvalidCredentials { .. }));
    assert_eq!(
        use_case
            .limiter()
            .remaining_attempts(&key("nobody@example.com"))
            .await
            .unwrap(),
        4
    );
}

#[tokio::test]
async fn sign_in_disabled_account_rejected_after_credential_check() {
    let store = MemoryStore::default();
    seed_principal(&store, "owner@example.com", "correct horse battery", false);

    let use_case = sign_in_use_case(&store, config());
    let err = use_case
        .execute(login("owner@example.com", "correct horse battery"), client())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AccountDisabled));
}
