//! Application Configuration
//!
//! Configuration for the Auth application layer. Constructed once at
//! startup and injected by reference; there is no package-level secret
//! state, so tests can substitute keys freely.

use std::time::Duration;

/// Credential check strategy selection
#[derive(Debug, Clone)]
pub enum VerifierStrategy {
    /// Compare against the stored Argon2id hash
    PasswordHash,
    /// Delegate to an external directory bind endpoint
    DirectoryBind {
        endpoint: String,
        timeout: Duration,
    },
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for access claims (32 bytes)
    pub signing_secret: [u8; 32],
    /// AES-256-GCM key sealing refresh tokens for transport (32 bytes)
    pub transport_key: [u8; 32],
    /// Issuer embedded in and required from access claims
    pub issuer: String,
    /// Access token lifetime (24 hours)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime without "Remember Me" (7 days)
    pub refresh_token_ttl: Duration,
    /// Refresh token lifetime with "Remember Me" (30 days)
    pub refresh_token_ttl_remember: Duration,
    /// Failed attempts within the window before lockout
    pub attempt_threshold: u32,
    /// Trailing window over which failures are counted (15 minutes)
    pub attempt_window: Duration,
    /// How long a tripped lockout lasts (5 minutes)
    pub lockout_duration: Duration,
    /// Which credential check strategy to use
    pub verifier: VerifierStrategy,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: [0u8; 32],
            transport_key: [0u8; 32],
            issuer: "pos-api".to_string(),
            access_token_ttl: Duration::from_secs(24 * 3600),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            refresh_token_ttl_remember: Duration::from_secs(30 * 24 * 3600),
            attempt_threshold: 5,
            attempt_window: Duration::from_secs(15 * 60),
            lockout_duration: Duration::from_secs(5 * 60),
            verifier: VerifierStrategy::PasswordHash,
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with random secrets (for development and tests)
    pub fn with_random_secrets() -> Self {
        let mut signing_secret = [0u8; 32];
        signing_secret.copy_from_slice(&platform::crypto::random_bytes(32));

        let mut transport_key = [0u8; 32];
        transport_key.copy_from_slice(&platform::crypto::random_bytes(32));

        Self {
            signing_secret,
            transport_key,
            ..Default::default()
        }
    }

    /// Development config
    pub fn development() -> Self {
        Self::with_random_secrets()
    }

    /// Refresh lifetime for the given remember-me choice
    pub fn refresh_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.refresh_token_ttl_remember
        } else {
            self.refresh_token_ttl
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
