//! Login Method Value Object
//!
//! Tags a session with how the credential check was performed.

use serde::{Deserialize, Serialize};

/// How the session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    /// Local password hash comparison
    Password,
    /// External directory bind
    Directory,
    /// Externally verified identity assertion (e.g. OIDC id token)
    Federated,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Password => "password",
            LoginMethod::Directory => "directory",
            LoginMethod::Federated => "federated",
        }
    }

    /// Parse a stored tag; unknown tags fall back to `Password`.
    pub fn from_db(s: &str) -> Self {
        match s {
            "directory" => LoginMethod::Directory,
            "federated" => LoginMethod::Federated,
            _ => LoginMethod::Password,
        }
    }
}

impl std::fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
