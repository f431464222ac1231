//! Credential Verifier Implementations
//!
//! Two interchangeable strategies behind the `CredentialVerifier` port:
//! local Argon2id hash comparison and delegation to an external directory
//! bind endpoint. Selection happens once, from configuration.

use std::time::Duration;

use serde::Serialize;

use crate::application::config::{AuthConfig, VerifierStrategy};
use crate::domain::repository::{CredentialVerifier, VerifierError};
use crate::domain::value_object::IdentityKey;
use platform::password::{ClearTextPassword, HashedPassword};

/// Strategy (a): compare against the stored Argon2id hash.
#[derive(Clone)]
pub struct PasswordHashVerifier {
    pepper: Option<Vec<u8>>,
}

impl PasswordHashVerifier {
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self { pepper }
    }
}

impl CredentialVerifier for PasswordHashVerifier {
    async fn verify(
        &self,
        _handle: &IdentityKey,
        supplied: &str,
        stored_hash: Option<&str>,
    ) -> Result<bool, VerifierError> {
        // Accounts without a local hash (directory-only) can never pass here
        let Some(stored) = stored_hash else {
            return Ok(false);
        };

        let hashed =
            HashedPassword::from_phc_string(stored).map_err(|_| VerifierError::BadStoredHash)?;

        // A supplied secret that fails policy cannot be the stored one
        let Ok(password) = ClearTextPassword::new(supplied.to_string()) else {
            return Ok(false);
        };

        Ok(hashed.verify(&password, self.pepper.as_deref()))
    }
}

#[derive(Serialize)]
struct BindRequest<'a> {
    handle: &'a str,
    secret: &'a str,
}

/// Strategy (b): delegate to an external directory bind endpoint.
///
/// The endpoint performs its own bind and answers with 2xx (allow) or
/// 401/403 (deny); anything else is a technical error. Each call is
/// bounded by the configured timeout so a directory outage degrades to
/// fast failures.
#[derive(Clone)]
pub struct DirectoryBindVerifier {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl DirectoryBindVerifier {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

impl CredentialVerifier for DirectoryBindVerifier {
    async fn verify(
        &self,
        handle: &IdentityKey,
        supplied: &str,
        _stored_hash: Option<&str>,
    ) -> Result<bool, VerifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&BindRequest {
                handle: handle.as_str(),
                secret: supplied,
            })
            .send()
            .await
            .map_err(|e| VerifierError::Directory(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Ok(false)
        } else {
            Err(VerifierError::Directory(format!(
                "bind endpoint returned status {status}"
            )))
        }
    }
}

/// Configured credential verifier.
///
/// Enum dispatch over the two strategies; the sign-in flow only sees the
/// `CredentialVerifier` capability.
#[derive(Clone)]
pub enum Verifier {
    Password(PasswordHashVerifier),
    Directory(DirectoryBindVerifier),
}

impl Verifier {
    pub fn from_config(config: &AuthConfig) -> Self {
        match &config.verifier {
            VerifierStrategy::PasswordHash => {
                Verifier::Password(PasswordHashVerifier::new(config.password_pepper.clone()))
            }
            VerifierStrategy::DirectoryBind { endpoint, timeout } => {
                Verifier::Directory(DirectoryBindVerifier::new(endpoint.clone(), *timeout))
            }
        }
    }
}

impl CredentialVerifier for Verifier {
    async fn verify(
        &self,
        handle: &IdentityKey,
        supplied: &str,
        stored_hash: Option<&str>,
    ) -> Result<bool, VerifierError> {
        match self {
            Verifier::Password(v) => v.verify(handle, supplied, stored_hash).await,
            Verifier::Directory(v) => v.verify(handle, supplied, stored_hash).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> IdentityKey {
        IdentityKey::new("owner@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_password_verifier_accepts_correct_password() {
        let password = ClearTextPassword::new("correct horse battery".to_string()).unwrap();
        let hash = password.hash(None).unwrap();

        let verifier = PasswordHashVerifier::new(None);
        let ok = verifier
            .verify(&key(), "correct horse battery", Some(hash.as_phc_string()))
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_password_verifier_rejects_wrong_password() {
        let password = ClearTextPassword::new("correct horse battery".to_string()).unwrap();
        let hash = password.hash(None).unwrap();

        let verifier = PasswordHashVerifier::new(None);
        let ok = verifier
            .verify(&key(), "incorrect horse battery", Some(hash.as_phc_string()))
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_password_verifier_rejects_missing_hash() {
        let verifier = PasswordHashVerifier::new(None);
        let ok = verifier.verify(&key(), "whatever123", None).await.unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_password_verifier_reports_malformed_hash() {
        let verifier = PasswordHashVerifier::new(None);
        let result = verifier
            .verify(&key(), "whatever123", Some("not-a-phc-string"))
            .await;
        assert!(matches!(result, Err(VerifierError::BadStoredHash)));
    }
}
