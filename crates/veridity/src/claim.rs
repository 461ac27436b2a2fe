//! Claims — schema-typed assertions stored as tree leaves.
//!
//! A claim carries a 16-byte schema hash, two index slots, two value
//! slots, a revocation nonce, and optionally a subject identifier and
//! an expiration. It encodes into eight 32-byte elements split into an
//! index group and a value group; the hashes of the two groups form the
//! `(index, value)` leaf inserted into the claims tree. Index slots
//! participate in the leaf key, value slots are payload only.
//!
//! Slot layout (circuit-facing numbering):
//!
//! ```text
//! i0  schema hash, version, flags      v0  revocation nonce, expiration
//! i1  subject identifier (or zero)     v1  reserved
//! i2  index data slot A                v2  value data slot A
//! i3  index data slot B                v3  value data slot B
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash::{hash_bytes, hash_elems, Digest};
use crate::error::{IdentityError, Result};
use crate::state::IdentityId;

/// Schema hash of the auth claim binding an identity's public key.
pub const AUTH_SCHEMA: SchemaHash = SchemaHash([
    0xca, 0x93, 0x88, 0x57, 0x24, 0x1d, 0xb9, 0x45, 0x1e, 0xa3, 0x29, 0x25, 0x6b, 0x9c, 0x06, 0xe5,
]);

/// A 16-byte schema hash identifying a credential type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaHash(pub [u8; 16]);

impl SchemaHash {
    /// Derive a schema hash from a schema document and credential type:
    /// the last 16 bytes of `SHA-256(document || credential_type)`.
    pub fn from_document(document: &[u8], credential_type: &str) -> Self {
        let mut input = Vec::with_capacity(document.len() + credential_type.len());
        input.extend_from_slice(document);
        input.extend_from_slice(credential_type.as_bytes());
        let digest = hash_bytes(&input);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.0[16..]);
        SchemaHash(bytes)
    }

    /// Parse from a 32-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s).map_err(|e| {
            IdentityError::SerializationError(format!("invalid schema hash hex: {e}"))
        })?;
        let bytes: [u8; 16] = raw.try_into().map_err(|_| {
            IdentityError::SerializationError("schema hash must be 16 bytes".into())
        })?;
        Ok(SchemaHash(bytes))
    }

    /// Return the hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for SchemaHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SchemaHash({})", self.to_hex())
    }
}

impl Serialize for SchemaHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SchemaHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SchemaHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 32-byte big-endian slot value.
///
/// Ordering is numeric (byte-wise big-endian), which is what the query
/// operators `lt` and `gt` compare with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SlotValue(pub [u8; 32]);

impl SlotValue {
    /// The zero slot.
    pub const ZERO: SlotValue = SlotValue([0u8; 32]);

    /// Build from a small integer (right-aligned big-endian).
    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        SlotValue(bytes)
    }

    /// View as a digest for hashing.
    pub fn as_digest(&self) -> Digest {
        Digest(self.0)
    }
}

impl std::fmt::Display for SlotValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for SlotValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SlotValue({})", hex::encode(self.0))
    }
}

impl From<u64> for SlotValue {
    fn from(v: u64) -> Self {
        SlotValue::from_u64(v)
    }
}

impl Serialize for SlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for SlotValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| serde::de::Error::custom("slot value must be 32 bytes"))?;
        Ok(SlotValue(bytes))
    }
}

/// A schema-typed assertion, stored as an `(index, value)` leaf pair.
///
/// Claims are immutable once built; revocation is a separate nonce
/// insertion into the revocation tree, never a mutation of the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub schema: SchemaHash,
    pub subject: Option<IdentityId>,
    pub index_slots: [SlotValue; 2],
    pub value_slots: [SlotValue; 2],
    pub revocation_nonce: u64,
    pub expiration: Option<i64>,
    pub version: u32,
}

impl Claim {
    /// Start building a claim for a schema.
    pub fn builder(schema: SchemaHash) -> ClaimBuilder {
        ClaimBuilder::new(schema)
    }

    /// Build the distinguished auth claim binding an Ed25519 public key.
    ///
    /// The 32-byte key is split across the two index data slots so the
    /// key participates in the leaf index. The revocation nonce is
    /// fixed at identity creation and identifies this auth claim in
    /// the revocation tree for its whole life.
    pub fn auth(verifying_key_bytes: &[u8; 32], revocation_nonce: u64) -> Self {
        let mut slot_a = [0u8; 32];
        let mut slot_b = [0u8; 32];
        slot_a[16..].copy_from_slice(&verifying_key_bytes[..16]);
        slot_b[16..].copy_from_slice(&verifying_key_bytes[16..]);
        Claim {
            schema: AUTH_SCHEMA,
            subject: None,
            index_slots: [SlotValue(slot_a), SlotValue(slot_b)],
            value_slots: [SlotValue::ZERO, SlotValue::ZERO],
            revocation_nonce,
            expiration: None,
            version: 0,
        }
    }

    /// The eight raw slot elements: `(index group, value group)`.
    pub fn raw_slots(&self) -> ([Digest; 4], [Digest; 4]) {
        let mut i0 = [0u8; 32];
        i0[..16].copy_from_slice(&self.schema.0);
        i0[16..20].copy_from_slice(&self.version.to_be_bytes());
        let mut flags = 0u8;
        if self.subject.is_some() {
            flags |= 0b01;
        }
        if self.expiration.is_some() {
            flags |= 0b10;
        }
        i0[20] = flags;

        let i1 = match &self.subject {
            Some(subject) => subject.to_slot().as_digest(),
            None => Digest::ZERO,
        };

        let mut v0 = [0u8; 32];
        v0[..8].copy_from_slice(&self.revocation_nonce.to_be_bytes());
        v0[8..16].copy_from_slice(&self.expiration.unwrap_or(0).to_be_bytes());

        (
            [
                Digest(i0),
                i1,
                self.index_slots[0].as_digest(),
                self.index_slots[1].as_digest(),
            ],
            [
                Digest(v0),
                Digest::ZERO,
                self.value_slots[0].as_digest(),
                self.value_slots[1].as_digest(),
            ],
        )
    }

    /// The `(index hash, value hash)` leaf pair for tree insertion.
    pub fn hi_hv(&self) -> (Digest, Digest) {
        let (index_group, value_group) = self.raw_slots();
        let hi = hash_elems(&[
            &index_group[0],
            &index_group[1],
            &index_group[2],
            &index_group[3],
        ]);
        let hv = hash_elems(&[
            &value_group[0],
            &value_group[1],
            &value_group[2],
            &value_group[3],
        ]);
        (hi, hv)
    }

    /// The claim digest `hash(index hash, value hash)` — what an issuer
    /// signs when issuing by signature.
    pub fn digest(&self) -> Digest {
        let (hi, hv) = self.hi_hv();
        hash_elems(&[&hi, &hv])
    }

    /// Resolve a circuit slot index to a data slot value.
    ///
    /// Only the four data slots are addressable: 2 and 3 (index data),
    /// 6 and 7 (value data). Header slots hold structure, not data.
    pub fn data_slot(&self, slot_index: usize) -> Option<SlotValue> {
        match slot_index {
            2 => Some(self.index_slots[0]),
            3 => Some(self.index_slots[1]),
            6 => Some(self.value_slots[0]),
            7 => Some(self.value_slots[1]),
            _ => None,
        }
    }

    /// The revocation-tree index for this claim's nonce.
    pub fn revocation_index(&self) -> Digest {
        Digest::from_u64(self.revocation_nonce)
    }

    /// Reassemble the Ed25519 public key bound by an auth claim.
    ///
    /// `None` for claims of any other schema.
    pub fn auth_public_key(&self) -> Option<[u8; 32]> {
        if self.schema != AUTH_SCHEMA {
            return None;
        }
        let mut key = [0u8; 32];
        key[..16].copy_from_slice(&self.index_slots[0].0[16..]);
        key[16..].copy_from_slice(&self.index_slots[1].0[16..]);
        Some(key)
    }
}

/// Builder for [`Claim`], mirroring how claims arrive over the API:
/// schema plus optional slots, nonce, subject, and expiration.
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    schema: SchemaHash,
    subject: Option<IdentityId>,
    index_slots: [SlotValue; 2],
    value_slots: [SlotValue; 2],
    revocation_nonce: Option<u64>,
    expiration: Option<i64>,
}

impl ClaimBuilder {
    fn new(schema: SchemaHash) -> Self {
        Self {
            schema,
            subject: None,
            index_slots: [SlotValue::ZERO, SlotValue::ZERO],
            value_slots: [SlotValue::ZERO, SlotValue::ZERO],
            revocation_nonce: None,
            expiration: None,
        }
    }

    /// Set the two index data slots (participate in the leaf key).
    pub fn index_data(mut self, a: SlotValue, b: SlotValue) -> Self {
        self.index_slots = [a, b];
        self
    }

    /// Set the two value data slots (payload only).
    pub fn value_data(mut self, a: SlotValue, b: SlotValue) -> Self {
        self.value_slots = [a, b];
        self
    }

    /// Set the revocation nonce. Uniqueness within one identity is the
    /// caller's responsibility; reuse silently ties the two claims'
    /// revocation together until the tree rejects the second insert.
    pub fn revocation_nonce(mut self, nonce: u64) -> Self {
        self.revocation_nonce = Some(nonce);
        self
    }

    /// Set the subject identifier.
    pub fn subject(mut self, id: IdentityId) -> Self {
        self.subject = Some(id);
        self
    }

    /// Set the expiration (epoch seconds).
    pub fn expiration(mut self, at: i64) -> Self {
        self.expiration = Some(at);
        self
    }

    /// Finalize the claim.
    pub fn build(self) -> Result<Claim> {
        let revocation_nonce = self.revocation_nonce.ok_or_else(|| {
            IdentityError::MalformedClaim("revocation nonce is required".into())
        })?;
        Ok(Claim {
            schema: self.schema,
            subject: self.subject,
            index_slots: self.index_slots,
            value_slots: self.value_slots,
            revocation_nonce,
            expiration: self.expiration,
            version: 0,
        })
    }
}
