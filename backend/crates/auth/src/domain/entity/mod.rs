//! Entities

pub mod login_attempt;
pub mod principal;
pub mod session;

pub use login_attempt::LoginAttempt;
pub use principal::Principal;
pub use session::{SessionInfo, SessionRecord};
