//! Auth (Authentication & Session Lifecycle) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, claims signing
//! - `application/` - Token service, login limiter, use cases
//! - `infra/` - Database implementations, credential verifiers
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Short-lived signed access tokens (HS256) scoped to an outlet
//! - Long-lived opaque refresh tokens with "Remember Me" extension
//! - One authoritative session record per identity, soft-invalidated
//! - Sliding-window login attempt limiting with temporary lockout
//!
//! ## Security Model
//! - Access tokens cross-checked against the stored session on every request
//! - Refresh tokens are AEAD-sealed random secrets, compared byte-for-byte
//! - Credential check failures never reveal which factor was wrong
//! - Store outages surface as 5xx, never as "unauthenticated"

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token_service::TokenService;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
