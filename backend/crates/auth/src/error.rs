//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Externally, every token/session validation failure collapses into the
//! same 401 response; the fine-grained variants exist for logging and for
//! the state transitions inside the token service.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::claims::ClaimsError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password (never reveals which)
    #[error("Invalid email or password")]
    InvalidCredentials {
        /// Attempts left before lockout, when known
        remaining_attempts: Option<u32>,
    },

    /// Attempt limiter tripped; retry after the given duration
    #[error("Too many failed login attempts")]
    AccountLocked { retry_after: Duration },

    /// Principal exists but is not allowed to sign in
    #[error("Account is disabled")]
    AccountDisabled,

    /// Malformed, unsigned, or expired access token
    #[error("Invalid or expired access token")]
    TokenInvalid,

    /// No session record exists for the token's identity
    #[error("No session found for identity")]
    SessionNotFound,

    /// Session record exists but has been invalidated
    #[error("Session has been revoked")]
    SessionRevoked,

    /// Presented token differs from the session's current token
    #[error("Presented token does not match the active session")]
    SessionMismatch,

    /// Refresh token lifetime is over; full re-authentication required
    #[error("Refresh token has expired")]
    RefreshExpired,

    /// Session/attempt store failure
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::AccountDisabled => StatusCode::FORBIDDEN,
            AuthError::TokenInvalid
            | AuthError::SessionNotFound
            | AuthError::SessionRevoked
            | AuthError::SessionMismatch
            | AuthError::RefreshExpired => StatusCode::UNAUTHORIZED,
            AuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials { .. }
            | AuthError::TokenInvalid
            | AuthError::SessionNotFound
            | AuthError::SessionRevoked
            | AuthError::SessionMismatch
            | AuthError::RefreshExpired => ErrorKind::Unauthorized,
            AuthError::AccountLocked { .. } => ErrorKind::TooManyRequests,
            AuthError::AccountDisabled => ErrorKind::Forbidden,
            AuthError::Store(_) => ErrorKind::ServiceUnavailable,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError with the externally visible message.
    ///
    /// Revoked / mismatched / missing sessions all read as a generic token
    /// failure to clients; only logs keep the distinction.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::InvalidCredentials {
                remaining_attempts: Some(remaining),
            } => AppError::unauthorized("Invalid email or password")
                .with_action(format!("Attempts remaining: {remaining}")),
            AuthError::InvalidCredentials { .. } => {
                AppError::unauthorized("Invalid email or password")
            }
            AuthError::AccountLocked { retry_after } => {
                AppError::too_many_requests("Too many failed login attempts")
                    .with_action(format!("Try again in {} seconds", retry_after.as_secs()))
            }
            AuthError::AccountDisabled => AppError::forbidden("Account is disabled"),
            AuthError::TokenInvalid
            | AuthError::SessionNotFound
            | AuthError::SessionRevoked
            | AuthError::SessionMismatch => AppError::unauthorized("Invalid or expired token"),
            AuthError::RefreshExpired => AppError::unauthorized("Refresh token has expired")
                .with_action("Sign in again"),
            AuthError::Store(_) => AppError::service_unavailable("Service temporarily unavailable"),
            AuthError::Internal(_) => AppError::internal("Internal server error"),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Auth store error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials { .. } => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked { retry_after } => {
                tracing::warn!(retry_after_secs = retry_after.as_secs(), "Login attempt on locked account");
            }
            AuthError::SessionMismatch => {
                tracing::warn!("Token does not match stored session");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<ClaimsError> for AuthError {
    fn from(err: ClaimsError) -> Self {
        match err {
            // Callers that need to distinguish expiry from forgery can match
            // on ClaimsError before converting; the response is 401 either way
            ClaimsError::Expired | ClaimsError::InvalidSignature => AuthError::TokenInvalid,
            ClaimsError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<platform::crypto::CipherError> for AuthError {
    fn from(err: platform::crypto::CipherError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
