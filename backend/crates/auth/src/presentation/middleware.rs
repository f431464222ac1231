//! Auth Middleware
//!
//! Per-request gate for protected routes. Extracts the bearer token,
//! validates it through the token service, and injects the request-scoped
//! identity context for downstream handlers. Missing or malformed headers
//! are rejected before the session store is ever touched.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::token_service::TokenService;
use crate::domain::repository::{
    LoginAttemptRepository, PrincipalRepository, SessionRepository,
};
use crate::domain::value_object::{OutletId, UserId};
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Request-scoped identity, available to handlers behind the middleware
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub outlet_id: OutletId,
}

/// Extract the bearer token from the Authorization header.
///
/// Returns `None` for a missing header, a non-Bearer scheme, or an empty
/// token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() { None } else { Some(token) }
}

/// Middleware that requires a valid access token
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let token = match bearer_token(req.headers()) {
        Some(token) => token.to_string(),
        None => return Err(AuthError::TokenInvalid.into_response()),
    };

    let tokens = TokenService::new(state.repo.clone(), state.config.clone());

    match tokens.validate(&token).await {
        Ok((user_id, outlet_id)) => {
            req.extensions_mut().insert(AuthContext { user_id, outlet_id });
            Ok(next.run(req).await)
        }
        Err(e) => Err(e.into_response()),
    }
}
