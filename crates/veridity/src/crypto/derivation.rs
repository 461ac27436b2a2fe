//! HKDF-SHA256 key derivation.
//!
//! Derives the snapshot encryption key from the Argon2id master key,
//! keeping the passphrase-derived key out of direct cipher use.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{IdentityError, Result};

/// Derive a 32-byte child key from a root key and context string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the root key as IKM and the
/// context as info.
pub fn derive_key(root_key_bytes: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, root_key_bytes);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| IdentityError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}

/// Derivation context for the snapshot encryption key.
pub fn snapshot_context() -> String {
    "veridity/snapshot-encryption".to_string()
}
