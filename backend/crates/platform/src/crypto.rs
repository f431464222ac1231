//! Cryptographic Utilities

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// AES-GCM nonce size in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Errors from [`TransportCipher`] operations.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption failed")]
    Seal,

    #[error("Decryption failed or ciphertext was tampered with")]
    Open,

    #[error("Ciphertext too short to contain a nonce")]
    Malformed,
}

/// Authenticated encryption for secrets handed to clients as opaque strings.
///
/// AES-256-GCM with a fresh random 96-bit nonce per call; the nonce is
/// prefixed to the ciphertext so the blob is self-contained. Callers that
/// only ever compare blobs byte-for-byte never need [`open`].
///
/// [`open`]: TransportCipher::open
#[derive(Clone)]
pub struct TransportCipher {
    cipher: Aes256Gcm,
}

impl TransportCipher {
    /// Create a cipher from a 256-bit key.
    pub fn new(key: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Seal)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a blob produced by [`seal`](TransportCipher::seal).
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() <= NONCE_LEN {
            return Err(CipherError::Malformed);
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        // SHA-256 of empty string
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);

        // SHA-256 of "hello"
        let hash = sha256(b"hello");
        let expected =
            hex::decode("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_base64_roundtrip() {
        let data = b"hello world";
        let encoded = to_base64(data);
        let decoded = from_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 3, 4];
        let c = [1u8, 2, 3, 5];
        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &b[..3]));
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = [7u8; 32];
        let cipher = TransportCipher::new(&key);

        let plaintext = b"opaque refresh secret";
        let blob = cipher.seal(plaintext).unwrap();
        assert!(blob.len() > NONCE_LEN + plaintext.len());

        let opened = cipher.open(&blob).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_seal_is_nondeterministic() {
        let key = [7u8; 32];
        let cipher = TransportCipher::new(&key);

        let a = cipher.seal(b"same input").unwrap();
        let b = cipher.seal(b"same input").unwrap();
        assert_ne!(a, b, "fresh nonce per call must change the blob");
    }

    #[test]
    fn test_open_rejects_tampering() {
        let key = [7u8; 32];
        let cipher = TransportCipher::new(&key);

        let mut blob = cipher.seal(b"secret").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(cipher.open(&blob), Err(CipherError::Open)));
    }

    #[test]
    fn test_open_rejects_short_blob() {
        let key = [7u8; 32];
        let cipher = TransportCipher::new(&key);
        assert!(matches!(
            cipher.open(&[0u8; NONCE_LEN]),
            Err(CipherError::Malformed)
        ));
    }

    #[test]
    fn test_open_rejects_wrong_key() {
        let cipher_a = TransportCipher::new(&[1u8; 32]);
        let cipher_b = TransportCipher::new(&[2u8; 32]);

        let blob = cipher_a.seal(b"secret").unwrap();
        assert!(cipher_b.open(&blob).is_err());
    }
}
