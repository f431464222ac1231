//! Access Token Claims
//!
//! Signing and verification of the self-contained access token. Claims are
//! ephemeral and never persisted; invalidation works by revoking the
//! session, which the token service cross-checks after verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::value_object::{OutletId, UserId};

/// Claims carried by every access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: opaque principal id
    pub sub: String,
    /// Tenant scope, so downstream authorization needs no extra lookup
    pub outlet_id: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }

    pub fn outlet_id(&self) -> OutletId {
        OutletId::new(self.outlet_id)
    }
}

/// Claims verification/signing errors
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Access token signature is invalid")]
    InvalidSignature,

    #[error("Access token has expired")]
    Expired,

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// HS256 signer/verifier for [`AccessClaims`].
///
/// Holds the key material derived from the injected configuration; there
/// is no process-global key, so tests can construct signers with their own
/// secrets.
#[derive(Clone)]
pub struct ClaimsSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl ClaimsSigner {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer,
        }
    }

    /// Sign fresh claims for an identity. Fails only on key misconfiguration.
    pub fn sign(
        &self,
        user_id: &UserId,
        outlet_id: OutletId,
        lifetime: Duration,
    ) -> Result<String, ClaimsError> {
        let now = Utc::now();

        let claims = AccessClaims {
            sub: user_id.to_string(),
            outlet_id: outlet_id.as_i64(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ClaimsError::Signing(e.to_string()))
    }

    /// Verify signature, expiry and issuer; return the claims.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, ClaimsError> {
        decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ClaimsError::Expired,
                _ => ClaimsError::InvalidSignature,
            })
    }
}
