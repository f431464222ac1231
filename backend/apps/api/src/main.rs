//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::bail;
use auth::config::VerifierStrategy;
use auth::{AuthConfig, PgAuthRepository, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Login attempts older than this are swept at startup
const ATTEMPT_RETENTION_HOURS: i64 = 24;
/// Session records untouched for this long are swept at startup
const SESSION_RETENTION_DAYS: i64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    // Short acquire timeout so a store outage degrades to fast failures
    // instead of request pile-up
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup retention sweep: normal flow never deletes sessions or
    // attempt records, so stale rows are pruned here.
    // Errors must not prevent server startup.
    let repo_for_sweep = PgAuthRepository::new(pool.clone());
    let attempt_cutoff = Utc::now() - Duration::hours(ATTEMPT_RETENTION_HOURS);
    let session_cutoff = Utc::now() - Duration::days(SESSION_RETENTION_DAYS);

    match repo_for_sweep.prune_old_attempts(attempt_cutoff).await {
        Ok(deleted) => {
            tracing::info!(attempts_deleted = deleted, "Login attempt sweep completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login attempt sweep failed, continuing anyway");
        }
    }

    match repo_for_sweep.prune_stale_sessions(session_cutoff).await {
        Ok(deleted) => {
            tracing::info!(sessions_deleted = deleted, "Session sweep completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session sweep failed, continuing anyway");
        }
    }

    let auth_config = build_auth_config()?;
    let auth_repo = PgAuthRepository::new(pool.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_repo, auth_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Assemble the auth configuration from the environment.
///
/// Debug builds fall back to random secrets; production requires both
/// secrets to be provided.
fn build_auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig {
            signing_secret: required_secret("AUTH_SIGNING_SECRET")?,
            transport_key: required_secret("AUTH_TRANSPORT_KEY")?,
            ..AuthConfig::default()
        }
    };

    if let Ok(issuer) = env::var("AUTH_ISSUER") {
        config.issuer = issuer;
    }

    if let Some(secs) = env_secs("ACCESS_TOKEN_TTL_SECS") {
        config.access_token_ttl = secs;
    }
    if let Some(secs) = env_secs("REFRESH_TOKEN_TTL_SECS") {
        config.refresh_token_ttl = secs;
    }
    if let Some(secs) = env_secs("REFRESH_TOKEN_TTL_REMEMBER_SECS") {
        config.refresh_token_ttl_remember = secs;
    }
    if let Some(threshold) = env::var("LOGIN_ATTEMPT_THRESHOLD")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.attempt_threshold = threshold;
    }
    if let Some(secs) = env_secs("LOGIN_ATTEMPT_WINDOW_SECS") {
        config.attempt_window = secs;
    }
    if let Some(secs) = env_secs("LOGIN_LOCKOUT_SECS") {
        config.lockout_duration = secs;
    }

    if let Ok(pepper) = env::var("AUTH_PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    // A configured directory endpoint switches the credential strategy
    if let Ok(endpoint) = env::var("DIRECTORY_BIND_URL") {
        let timeout = env_secs("DIRECTORY_BIND_TIMEOUT_SECS")
            .unwrap_or(std::time::Duration::from_secs(3));
        config.verifier = VerifierStrategy::DirectoryBind { endpoint, timeout };
    }

    Ok(config)
}

fn required_secret(name: &str) -> anyhow::Result<[u8; 32]> {
    let encoded =
        env::var(name).unwrap_or_else(|_| panic!("{name} must be set in production"));
    let bytes = Engine::decode(&general_purpose::STANDARD, &encoded)?;

    if bytes.len() != 32 {
        bail!("{name} must decode to exactly 32 bytes, got {}", bytes.len());
    }

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&bytes);
    Ok(secret)
}

fn env_secs(name: &str) -> Option<std::time::Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(std::time::Duration::from_secs)
}
