//! SHA-256 digests and multi-element hashing.
//!
//! Every hash in the system — tree nodes, claim leaves, identity
//! states, transition digests — is a 32-byte [`Digest`]. Multi-element
//! hashes concatenate fixed-width 32-byte inputs, so the encoding is
//! unambiguous without length prefixes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};

/// A 32-byte SHA-256 digest, compared and serialized big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The all-zero digest. Used as the empty-tree root and the empty
    /// slot marker inside tree nodes.
    pub const ZERO: Digest = Digest([0u8; 32]);

    /// Whether this is the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Build a digest holding a small integer (big-endian, right-aligned).
    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Digest(bytes)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> crate::error::Result<Self> {
        let raw = hex::decode(s).map_err(|e| {
            crate::error::IdentityError::SerializationError(format!("invalid digest hex: {e}"))
        })?;
        let bytes: [u8; 32] = raw.try_into().map_err(|_| {
            crate::error::IdentityError::SerializationError("digest must be 32 bytes".into())
        })?;
        Ok(Digest(bytes))
    }

    /// Return the hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Bit `i` of the digest interpreted as a big-endian integer
    /// (bit 0 is the least significant). Drives tree path selection.
    pub fn bit(&self, i: usize) -> bool {
        let byte = self.0[31 - i / 8];
        (byte >> (i % 8)) & 1 == 1
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({}…)", &self.to_hex()[..8])
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash a sequence of digests into one.
///
/// Deterministic multi-element hash used for identity states
/// (three roots), claim leaf pairs, and transition digests.
pub fn hash_elems(elems: &[&Digest]) -> Digest {
    let mut hasher = Sha256::new();
    for e in elems {
        hasher.update(e.0);
    }
    Digest(hasher.finalize().into())
}

/// Hash arbitrary bytes into a digest.
pub fn hash_bytes(bytes: &[u8]) -> Digest {
    Digest(Sha256::digest(bytes).into())
}
