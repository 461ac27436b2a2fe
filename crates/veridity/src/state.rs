//! Identity state and genesis identifier derivation.
//!
//! The identity state (IDS) is the hash of the three tree roots and is
//! recomputed after every mutation. The identifier is derived once,
//! deterministically, from the genesis state and never changes again;
//! whether a given state is the genesis state is therefore a pure
//! local computation, with no chain lookup involved.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::claim::SlotValue;
use crate::crypto::hash::{hash_elems, Digest};
use crate::error::{IdentityError, Result};

/// Identifier type prefix for the default (and currently only) method.
pub const ID_TYPE_DEFAULT: [u8; 2] = [0x01, 0x00];

/// Compute the identity state from the three tree roots.
pub fn compute_state(
    claims_root: &Digest,
    revocation_root: &Digest,
    roots_root: &Digest,
) -> Digest {
    hash_elems(&[claims_root, revocation_root, roots_root])
}

/// A point-in-time snapshot of an identity's trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub state: Digest,
    pub claims_root: Digest,
    pub revocation_root: Digest,
    pub roots_root: Digest,
}

impl TreeState {
    /// Build a snapshot from the three roots, computing the state.
    pub fn from_roots(claims_root: Digest, revocation_root: Digest, roots_root: Digest) -> Self {
        Self {
            state: compute_state(&claims_root, &revocation_root, &roots_root),
            claims_root,
            revocation_root,
            roots_root,
        }
    }
}

/// An identity identifier.
///
/// Layout (31 bytes): 2-byte type prefix, 27 genesis bytes taken from
/// the genesis state digest, 2-byte checksum over the preceding 29.
/// Displayed and serialized as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityId([u8; 31]);

impl IdentityId {
    /// Derive the identifier from a genesis identity state.
    pub fn genesis_from_state(state: &Digest) -> Self {
        let mut bytes = [0u8; 31];
        bytes[..2].copy_from_slice(&ID_TYPE_DEFAULT);
        bytes[2..29].copy_from_slice(&state.0[..27]);
        let checksum = Self::checksum(&bytes[..29]);
        bytes[29..].copy_from_slice(&checksum);
        IdentityId(bytes)
    }

    /// Whether `state` is this identity's genesis state.
    ///
    /// Pure recomputation; needs no external lookup.
    pub fn is_genesis(&self, state: &Digest) -> bool {
        Self::genesis_from_state(state) == *self
    }

    /// Raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 31] {
        &self.0
    }

    /// The identifier as a claim slot value (right-aligned).
    pub fn to_slot(&self) -> SlotValue {
        let mut bytes = [0u8; 32];
        bytes[1..].copy_from_slice(&self.0);
        SlotValue(bytes)
    }

    /// Parse from a base58 string, validating length, type, and checksum.
    pub fn from_base58(s: &str) -> Result<Self> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| IdentityError::InvalidIdentifier(format!("bad base58: {e}")))?;
        let bytes: [u8; 31] = raw
            .try_into()
            .map_err(|_| IdentityError::InvalidIdentifier("identifier must be 31 bytes".into()))?;
        if bytes[..2] != ID_TYPE_DEFAULT {
            return Err(IdentityError::InvalidIdentifier(format!(
                "unknown identifier type {:02x}{:02x}",
                bytes[0], bytes[1]
            )));
        }
        if bytes[29..] != Self::checksum(&bytes[..29]) {
            return Err(IdentityError::InvalidIdentifier("checksum mismatch".into()));
        }
        Ok(IdentityId(bytes))
    }

    // 16-bit little-endian byte sum, matching the serialized layout.
    fn checksum(bytes: &[u8]) -> [u8; 2] {
        let sum: u16 = bytes.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16));
        sum.to_le_bytes()
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl std::fmt::Debug for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityId({self})")
    }
}

impl std::str::FromStr for IdentityId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl Serialize for IdentityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IdentityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        IdentityId::from_base58(&s).map_err(serde::de::Error::custom)
    }
}
