//! Identity Key Value Object
//!
//! Normalized login handle (email) used to key login attempts and
//! credential lookups. Normalization: trim whitespace, lowercase.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityKeyError {
    #[error("Identity key cannot be empty")]
    Empty,
}

/// Normalized email used as the attempt/lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(raw: &str) -> Result<Self, IdentityKeyError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdentityKeyError::Empty);
        }
        Ok(Self(normalized))
    }

    /// Rehydrate from storage without re-normalizing
    pub fn from_db(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
