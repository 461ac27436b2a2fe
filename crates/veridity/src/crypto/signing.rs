//! Ed25519 signing and verification over digests.
//!
//! Transition signatures, issuer claim signatures, and challenge
//! signatures all sign a 32-byte [`Digest`], never raw structures:
//! the caller hashes first, so two records with the same digest carry
//! interchangeable signatures.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::crypto::hash::Digest;
use crate::error::{IdentityError, Result};

/// Sign a digest with an Ed25519 signing key.
pub fn sign_digest(signing_key: &SigningKey, digest: &Digest) -> Signature {
    signing_key.sign(&digest.0)
}

/// Verify an Ed25519 signature over a digest.
pub fn verify_digest(
    verifying_key: &VerifyingKey,
    digest: &Digest,
    signature: &Signature,
) -> Result<()> {
    verifying_key
        .verify(&digest.0, signature)
        .map_err(|_| IdentityError::SignatureInvalid)
}

/// Sign a digest and return the signature as a base64-encoded string.
pub fn sign_to_base64(signing_key: &SigningKey, digest: &Digest) -> String {
    let sig = sign_digest(signing_key, digest);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, sig.to_bytes())
}

/// Verify a base64-encoded signature over a digest.
pub fn verify_from_base64(
    verifying_key: &VerifyingKey,
    digest: &Digest,
    signature_b64: &str,
) -> Result<()> {
    let sig_bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, signature_b64)
            .map_err(|e| IdentityError::InvalidKey(format!("invalid base64 signature: {e}")))?;

    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| IdentityError::InvalidKey("signature must be 64 bytes".into()))?;

    let signature = Signature::from_bytes(&sig_array);
    verify_digest(verifying_key, digest, &signature)
}
