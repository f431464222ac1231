//! Domain Layer
//!
//! Contains entities, value objects, repository traits, and claims signing.

pub mod claims;
pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use claims::{AccessClaims, ClaimsSigner};
pub use entity::{login_attempt::LoginAttempt, principal::Principal, session::SessionRecord};
pub use repository::{
    CredentialVerifier, LoginAttemptRepository, PrincipalRepository, SessionRepository,
};
