//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod postgres;
pub mod verifier;

pub use postgres::PgAuthRepository;
pub use verifier::{DirectoryBindVerifier, PasswordHashVerifier, Verifier};
