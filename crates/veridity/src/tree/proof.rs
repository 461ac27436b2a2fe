//! Merkle proofs — inclusion and exclusion.
//!
//! A proof is verified against a root without access to the tree that
//! produced it. Exclusion proofs come in two shapes: the path ends at
//! an empty slot, or it ends at a different leaf whose index shares the
//! traversed prefix (carried in [`NodeAux`]).

use serde::{Deserialize, Serialize};

use super::{leaf_digest, node_digest};
use crate::crypto::hash::Digest;

/// The foreign leaf terminating an exclusion path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAux {
    pub index: Digest,
    pub value: Digest,
}

/// An inclusion-or-exclusion proof for one index against one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// `true` for inclusion, `false` for exclusion.
    pub existence: bool,
    /// Sibling digests along the path, root-side first.
    pub siblings: Vec<Digest>,
    /// For exclusion proofs ending at a foreign leaf.
    pub node_aux: Option<NodeAux>,
}

impl MerkleProof {
    /// Verify this proof against `root` for the given `index`.
    ///
    /// For inclusion proofs `value` must be the leaf value that was
    /// inserted. For exclusion proofs `value` is ignored (pass
    /// [`Digest::ZERO`]).
    pub fn verify(&self, root: &Digest, index: &Digest, value: &Digest) -> bool {
        let mut acc = if self.existence {
            leaf_digest(index, value)
        } else {
            match &self.node_aux {
                Some(aux) => {
                    // An exclusion path ending at the queried index itself
                    // is contradictory.
                    if aux.index == *index {
                        return false;
                    }
                    leaf_digest(&aux.index, &aux.value)
                }
                None => Digest::ZERO,
            }
        };

        for level in (0..self.siblings.len()).rev() {
            let sibling = &self.siblings[level];
            acc = if index.bit(level) {
                node_digest(sibling, &acc)
            } else {
                node_digest(&acc, sibling)
            };
        }

        acc == *root
    }

    /// Whether this proof demonstrates the index is absent.
    pub fn is_exclusion(&self) -> bool {
        !self.existence
    }

    /// Siblings padded with zero digests to a fixed depth, as circuit
    /// input assembly expects a constant-width array.
    pub fn padded_siblings(&self, depth: usize) -> Vec<Digest> {
        let mut out = self.siblings.clone();
        out.resize(depth, Digest::ZERO);
        out
    }
}
