//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::client::{extract_client_info, extract_client_ip};

use crate::application::config::AuthConfig;
use crate::application::{
    RefreshAccessUseCase, RefreshInput, SignInInput, SignInUseCase, SignOutUseCase,
};
use crate::domain::repository::{
    LoginAttemptRepository, PrincipalRepository, SessionRepository,
};
use crate::error::AuthResult;
use crate::infra::verifier::Verifier;
use crate::presentation::dto::{
    LoginRequest, LoginResponse, LogoutAllResponse, RefreshRequest, RefreshResponse,
    SessionView, SessionsResponse,
};
use crate::presentation::middleware::AuthContext;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub verifier: Arc<Verifier>,
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let client = extract_client_info(&headers, client_ip);

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.verifier.clone(),
        state.config.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
        remember_me: req.remember_me,
    };

    let output = use_case.execute(input, client).await?;

    Ok(Json(LoginResponse {
        user_id: output.user_id.to_string(),
        outlet_id: output.outlet_id.as_i64(),
        access_token: output.access_token,
        refresh_token: output.refresh_token,
        refresh_expires_at_ms: output.refresh_expires_at.timestamp_millis(),
    }))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<RefreshResponse>>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let use_case = RefreshAccessUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(RefreshInput {
            user_id: req.user_id,
            refresh_token: req.refresh_token,
        })
        .await?;

    Ok(Json(RefreshResponse {
        access_token: output.access_token,
    }))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<impl IntoResponse>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(&ctx.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/logout/all
pub async fn logout_all<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<LogoutAllResponse>>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
    let invalidated = use_case.execute_all(&ctx.user_id).await?;

    Ok(Json(LogoutAllResponse { invalidated }))
}

// ============================================================================
// Active Sessions
// ============================================================================

/// GET /api/auth/sessions
pub async fn sessions<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<SessionsResponse>>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let records = state.repo.find_active(&ctx.user_id).await?;

    let sessions: Vec<SessionView> = records
        .iter()
        .map(|record| SessionView {
            last_ip: record.last_ip.clone(),
            last_user_agent: record.last_user_agent.clone(),
            last_login_at_ms: record.last_login_at.timestamp_millis(),
            remember_me: record.remember_me,
            login_method: record.login_method.as_str().to_string(),
        })
        .collect();

    let total = sessions.len();

    Ok(Json(SessionsResponse { sessions, total }))
}
