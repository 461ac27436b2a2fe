//! Sparse Merkle tree accumulator.
//!
//! Each identity owns three instances: the claims tree, the revocation
//! tree, and the historical-roots tree. The node store is append-only,
//! so proofs can be generated against any root the tree has ever had —
//! required when proving a claim against a now-superseded state.
//!
//! - [`smt::AccumulatorTree`] — add / prove / root.
//! - [`proof::MerkleProof`] — inclusion-or-exclusion proof, verifiable
//!   without access to the tree.

pub mod proof;
pub mod smt;

pub use proof::{MerkleProof, NodeAux};
pub use smt::AccumulatorTree;

use crate::crypto::hash::Digest;
use sha2::{Digest as Sha2Digest, Sha256};

/// Maximum tree depth. Two leaves whose indexes share a longer common
/// bit prefix cannot coexist.
pub const MAX_DEPTH: usize = 64;

/// Domain tag for leaf hashing.
const LEAF_TAG: u8 = 0x01;
/// Domain tag for internal-node hashing.
const NODE_TAG: u8 = 0x02;

/// Hash a leaf entry. Domain-separated from internal nodes so a leaf
/// can never be presented as a subtree.
pub(crate) fn leaf_digest(index: &Digest, value: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    hasher.update(index.0);
    hasher.update(value.0);
    Digest(hasher.finalize().into())
}

/// Hash an internal node from its two children.
pub(crate) fn node_digest(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([NODE_TAG]);
    hasher.update(left.0);
    hasher.update(right.0);
    Digest(hasher.finalize().into())
}
