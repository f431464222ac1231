//! Login Attempt Entity
//!
//! Append-only fact recorded for every login attempt, successful or not.
//! Only ever used in aggregate (counted within a trailing window) plus the
//! most-recent-failure lookup; never mutated after creation.

use chrono::{DateTime, Utc};

use crate::domain::value_object::IdentityKey;

/// A single recorded login attempt
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    /// Normalized login handle the attempt was made against
    pub identity_key: IdentityKey,
    /// Source IP, when known
    pub source_ip: Option<String>,
    /// When the attempt happened
    pub attempted_at: DateTime<Utc>,
    /// Outcome
    pub succeeded: bool,
}

impl LoginAttempt {
    pub fn new(identity_key: IdentityKey, source_ip: Option<String>, succeeded: bool) -> Self {
        Self {
            identity_key,
            source_ip,
            attempted_at: Utc::now(),
            succeeded,
        }
    }
}
