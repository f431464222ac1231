//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{
    LoginAttemptRepository, PrincipalRepository, SessionRepository,
};
use crate::infra::postgres::PgAuthRepository;
use crate::infra::verifier::Verifier;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(repo: R, config: AuthConfig) -> Router
where
    R: SessionRepository
        + LoginAttemptRepository
        + PrincipalRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let verifier = Arc::new(Verifier::from_config(&config));

    let state = AuthAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
        verifier,
    };

    let protected = Router::new()
        .route("/logout", post(handlers::logout::<R>))
        .route("/logout/all", post(handlers::logout_all::<R>))
        .route("/sessions", get(handlers::sessions::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R>,
        ));

    Router::new()
        .route("/login", post(handlers::login::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .merge(protected)
        .with_state(state)
}
