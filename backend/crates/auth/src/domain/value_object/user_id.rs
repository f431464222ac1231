//! User ID Value Object
//!
//! Opaque principal identifier. The auth subsystem never interprets it;
//! it is minted by user registration and passed through verbatim.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Opaque principal id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
