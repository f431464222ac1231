//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod login_limiter;
pub mod refresh;
pub mod sign_in;
pub mod sign_out;
pub mod token_service;

// Re-exports
pub use config::{AuthConfig, VerifierStrategy};
pub use login_limiter::{LockState, LoginLimiter};
pub use refresh::{RefreshAccessUseCase, RefreshInput, RefreshOutput};
pub use sign_in::{ClientInfo, SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use token_service::{IssuedTokens, TokenService};
