//! Ed25519 key pair for identity signing.
//!
//! An identity's key pair signs state transitions, claim digests, and
//! challenges. The public key is bound into the identity's auth claim
//! at genesis. The signing key is zeroized on drop.

use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::error::{IdentityError, Result};

/// An Ed25519 key pair for signing operations.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Reconstruct a verifying key from raw bytes.
    pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(bytes)
            .map_err(|e| IdentityError::InvalidKey(format!("invalid verifying key: {e}")))
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Return the signing key bytes. Caller must zeroize after use.
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Return the verifying key bytes.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        // SigningKey stores bytes internally; zeroize via conversion
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
