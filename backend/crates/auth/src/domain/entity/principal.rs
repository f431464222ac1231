//! Principal Entity
//!
//! The minimal slice of the externally managed user record that the
//! sign-in flow reads. Registration and profile management live outside
//! this subsystem; this entity is read-only here.

use crate::domain::value_object::{IdentityKey, OutletId, UserId};

/// Read-only view of a user for authentication purposes
#[derive(Debug, Clone)]
pub struct Principal {
    /// Opaque principal id
    pub user_id: UserId,
    /// Login handle (normalized email)
    pub identity_key: IdentityKey,
    /// Tenant scope to embed in issued tokens
    pub outlet_id: OutletId,
    /// Stored password hash (PHC string); absent for directory-only accounts
    pub password_hash: Option<String>,
    /// Whether the account may sign in at all
    pub is_active: bool,
}

impl Principal {
    pub fn can_login(&self) -> bool {
        self.is_active
    }
}
