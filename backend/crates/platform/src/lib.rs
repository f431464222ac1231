//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG, SHA-256, Base64, constant-time compare)
//! - Authenticated encryption for opaque client-held tokens (AES-256-GCM)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Client identification (User-Agent fingerprint, proxy-aware IP)

pub mod client;
pub mod crypto;
pub mod password;
