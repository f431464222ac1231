//! Session Record Entity
//!
//! The durable server-side state tying an identity to its current token
//! pair. One valid record is authoritative per identity; logins, refreshes
//! and rotations mutate it in place, logout flips the validity flag.
//! Records are never deleted by normal flow.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{LoginMethod, OutletId, UserId};

/// Session record entity
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Identity this session belongs to (also the storage key)
    pub user_id: UserId,
    /// Tenant scope captured at login
    pub outlet_id: OutletId,
    /// Last-seen client IP (for session listings and audit)
    pub last_ip: Option<String>,
    /// Last-seen client signature (User-Agent string)
    pub last_user_agent: Option<String>,
    /// Current access token, for liveness correlation on validate
    pub access_token: String,
    /// Current opaque refresh token (sealed blob, compared byte-for-byte)
    pub refresh_token: String,
    /// Instant the refresh token stops being accepted
    pub refresh_expires_at: DateTime<Utc>,
    /// Last successful login
    pub last_login_at: DateTime<Utc>,
    /// Validity flag; false once invalidated
    pub is_valid: bool,
    /// Whether "Remember Me" was requested at login
    pub remember_me: bool,
    /// How the credential check was performed
    pub login_method: LoginMethod,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a new session record for a fresh login.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        outlet_id: OutletId,
        access_token: String,
        refresh_token: String,
        refresh_expires_at: DateTime<Utc>,
        remember_me: bool,
        login_method: LoginMethod,
        last_ip: Option<String>,
        last_user_agent: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id,
            outlet_id,
            last_ip,
            last_user_agent,
            access_token,
            refresh_token,
            refresh_expires_at,
            last_login_at: now,
            is_valid: true,
            remember_me,
            login_method,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the refresh token's lifetime has passed.
    pub fn is_refresh_expired(&self) -> bool {
        Utc::now() > self.refresh_expires_at
    }

    /// Flip the validity flag. Historical data stays in place.
    pub fn invalidate(&mut self) {
        self.is_valid = false;
        self.updated_at = Utc::now();
    }

    /// Replace the access token after a rotation.
    ///
    /// The previous token will fail validation from this point on; that is
    /// the mechanism that retires rotated-away tokens.
    pub fn replace_access_token(&mut self, access_token: String) {
        self.access_token = access_token;
        self.updated_at = Utc::now();
    }

    /// Push the refresh expiry forward by one lifetime from now.
    pub fn extend_refresh(&mut self, lifetime: Duration) {
        self.refresh_expires_at = Utc::now() + lifetime;
        self.updated_at = Utc::now();
    }
}

/// Session info for API responses (non-sensitive)
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub last_ip: Option<String>,
    pub last_user_agent: Option<String>,
    pub last_login_at: DateTime<Utc>,
    pub remember_me: bool,
    pub login_method: LoginMethod,
}

impl From<&SessionRecord> for SessionInfo {
    fn from(session: &SessionRecord) -> Self {
        Self {
            last_ip: session.last_ip.clone(),
            last_user_agent: session.last_user_agent.clone(),
            last_login_at: session.last_login_at,
            remember_me: session.remember_me,
            login_method: session.login_method,
        }
    }
}
