//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub outlet_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    /// Instant the refresh token stops being accepted (Unix ms)
    pub refresh_expires_at_ms: i64,
}

// ============================================================================
// Refresh
// ============================================================================

/// Refresh request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub user_id: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

// ============================================================================
// Logout
// ============================================================================

/// Logout-everywhere response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutAllResponse {
    pub invalidated: u64,
}

// ============================================================================
// Active Sessions
// ============================================================================

/// One active session (non-sensitive metadata only)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub last_ip: Option<String>,
    pub last_user_agent: Option<String>,
    pub last_login_at_ms: i64,
    pub remember_me: bool,
    pub login_method: String,
}

/// Active sessions response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub sessions: Vec<SessionView>,
    pub total: usize,
}
