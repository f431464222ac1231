//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::{LoginAttempt, Principal, SessionRecord};
use crate::domain::repository::{LoginAttemptRepository, PrincipalRepository, SessionRepository};
use crate::domain::value_object::{IdentityKey, LoginMethod, OutletId, UserId};
use crate::error::AuthResult;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retention sweep: delete session records untouched since the cutoff.
    ///
    /// Normal flow never deletes sessions; this runs at startup or from a
    /// scheduled job.
    pub async fn prune_stale_sessions(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Pruned stale auth sessions");

        Ok(deleted)
    }

    /// Retention sweep: delete login attempts older than the cutoff.
    pub async fn prune_old_attempts(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM login_attempts WHERE attempted_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(attempts_deleted = deleted, "Pruned old login attempts");

        Ok(deleted)
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn upsert(&self, session: &SessionRecord) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                user_id,
                outlet_id,
                last_ip,
                last_user_agent,
                access_token,
                refresh_token,
                refresh_expires_at,
                last_login_at,
                is_valid,
                remember_me,
                login_method,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE SET
                outlet_id = EXCLUDED.outlet_id,
                last_ip = EXCLUDED.last_ip,
                last_user_agent = EXCLUDED.last_user_agent,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                refresh_expires_at = EXCLUDED.refresh_expires_at,
                last_login_at = EXCLUDED.last_login_at,
                is_valid = EXCLUDED.is_valid,
                remember_me = EXCLUDED.remember_me,
                login_method = EXCLUDED.login_method,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(session.user_id.as_str())
        .bind(session.outlet_id.as_i64())
        .bind(&session.last_ip)
        .bind(&session.last_user_agent)
        .bind(&session.access_token)
        .bind(&session.refresh_token)
        .bind(session.refresh_expires_at)
        .bind(session.last_login_at)
        .bind(session.is_valid)
        .bind(session.remember_me)
        .bind(session.login_method.as_str())
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                user_id,
                outlet_id,
                last_ip,
                last_user_agent,
                access_token,
                refresh_token,
                refresh_expires_at,
                last_login_at,
                is_valid,
                remember_me,
                login_method,
                created_at,
                updated_at
            FROM auth_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn find_by_refresh_token(
        &self,
        user_id: &UserId,
        refresh_token: &str,
    ) -> AuthResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                user_id,
                outlet_id,
                last_ip,
                last_user_agent,
                access_token,
                refresh_token,
                refresh_expires_at,
                last_login_at,
                is_valid,
                remember_me,
                login_method,
                created_at,
                updated_at
            FROM auth_sessions
            WHERE user_id = $1 AND refresh_token = $2 AND is_valid
            "#,
        )
        .bind(user_id.as_str())
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn set_access_token(&self, user_id: &UserId, access_token: &str) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                access_token = $2,
                updated_at = $3
            WHERE user_id = $1 AND is_valid
            "#,
        )
        .bind(user_id.as_str())
        .bind(access_token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn extend_refresh_expiry(
        &self,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                refresh_expires_at = $2,
                updated_at = $3
            WHERE user_id = $1 AND is_valid
            "#,
        )
        .bind(user_id.as_str())
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn invalidate(&self, user_id: &UserId) -> AuthResult<bool> {
        let matched = sqlx::query(
            r#"
            UPDATE auth_sessions SET
                is_valid = FALSE,
                updated_at = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(matched > 0)
    }

    async fn invalidate_all(&self, user_id: &UserId) -> AuthResult<u64> {
        let matched = sqlx::query(
            r#"
            UPDATE auth_sessions SET
                is_valid = FALSE,
                updated_at = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(matched)
    }

    async fn find_active(&self, user_id: &UserId) -> AuthResult<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                user_id,
                outlet_id,
                last_ip,
                last_user_agent,
                access_token,
                refresh_token,
                refresh_expires_at,
                last_login_at,
                is_valid,
                remember_me,
                login_method,
                created_at,
                updated_at
            FROM auth_sessions
            WHERE user_id = $1 AND is_valid
            ORDER BY last_login_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionRow::into_session).collect())
    }
}

// ============================================================================
// Login Attempt Repository Implementation
// ============================================================================

impl LoginAttemptRepository for PgAuthRepository {
    async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_attempts (
                identity_key,
                source_ip,
                attempted_at,
                succeeded
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(attempt.identity_key.as_str())
        .bind(&attempt.source_ip)
        .bind(attempt.attempted_at)
        .bind(attempt.succeeded)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_failures_since(
        &self,
        key: &IdentityKey,
        since: DateTime<Utc>,
    ) -> AuthResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM login_attempts
            WHERE identity_key = $1 AND succeeded = FALSE AND attempted_at > $2
            "#,
        )
        .bind(key.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn most_recent_failure(&self, key: &IdentityKey) -> AuthResult<Option<DateTime<Utc>>> {
        let ts = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT attempted_at
            FROM login_attempts
            WHERE identity_key = $1 AND succeeded = FALSE
            ORDER BY attempted_at DESC
            LIMIT 1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(ts)
    }

    async fn clear_failures(&self, key: &IdentityKey) -> AuthResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM login_attempts WHERE identity_key = $1 AND succeeded = FALSE",
        )
        .bind(key.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Principal Repository Implementation
// ============================================================================

impl PrincipalRepository for PgAuthRepository {
    async fn find_by_identity_key(&self, key: &IdentityKey) -> AuthResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT
                id,
                email,
                outlet_id,
                password_hash,
                is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PrincipalRow::into_principal))
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    outlet_id: i64,
    last_ip: Option<String>,
    last_user_agent: Option<String>,
    access_token: String,
    refresh_token: String,
    refresh_expires_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
    is_valid: bool,
    remember_me: bool,
    login_method: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> SessionRecord {
        SessionRecord {
            user_id: UserId::new(self.user_id),
            outlet_id: OutletId::new(self.outlet_id),
            last_ip: self.last_ip,
            last_user_agent: self.last_user_agent,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            refresh_expires_at: self.refresh_expires_at,
            last_login_at: self.last_login_at,
            is_valid: self.is_valid,
            remember_me: self.remember_me,
            login_method: LoginMethod::from_db(&self.login_method),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    id: String,
    email: String,
    outlet_id: Option<i64>,
    password_hash: Option<String>,
    is_active: bool,
}

impl PrincipalRow {
    fn into_principal(self) -> Principal {
        Principal {
            user_id: UserId::new(self.id),
            identity_key: IdentityKey::from_db(self.email),
            outlet_id: self.outlet_id.map(OutletId::new).unwrap_or(OutletId::NONE),
            password_hash: self.password_hash,
            is_active: self.is_active,
        }
    }
}
