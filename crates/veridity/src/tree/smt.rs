//! The sparse Merkle tree accumulator.
//!
//! Leaves are keyed by a 32-byte index digest; the path through the
//! trie follows the index bits, so the root is a pure function of the
//! inserted leaf set, independent of insertion order. Nodes are stored
//! in an append-only map keyed by node digest: superseded roots stay
//! resolvable, which is what lets an identity prove claims against an
//! old state long after later mutations.

use std::collections::{HashMap, HashSet};

use super::{leaf_digest, node_digest, MerkleProof, NodeAux, MAX_DEPTH};
use crate::crypto::hash::Digest;
use crate::error::{IdentityError, Result};

#[derive(Debug, Clone)]
enum Node {
    Leaf { index: Digest, value: Digest },
    Internal { left: Digest, right: Digest },
}

impl Node {
    fn digest(&self) -> Digest {
        match self {
            Node::Leaf { index, value } => leaf_digest(index, value),
            Node::Internal { left, right } => node_digest(left, right),
        }
    }
}

/// Append-only sparse Merkle tree.
#[derive(Debug, Clone, Default)]
pub struct AccumulatorTree {
    nodes: HashMap<Digest, Node>,
    roots: HashSet<Digest>,
    root: Digest,
    leaf_count: usize,
}

impl AccumulatorTree {
    /// Create an empty tree. The empty root is the zero digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current root.
    pub fn root(&self) -> Digest {
        self.root
    }

    /// Number of leaves inserted so far.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Insert a leaf keyed by `index`.
    ///
    /// Fails with `DuplicateLeaf` if the index is already present
    /// (regardless of value — leaves are immutable once inserted).
    pub fn add(&mut self, index: Digest, value: Digest) -> Result<()> {
        let mut siblings: Vec<Digest> = Vec::new();
        let mut current = self.root;
        let mut depth = 0usize;

        // Digest of the subtree that replaces `current` at `depth`.
        let subtree: Digest;

        loop {
            if current.is_zero() {
                subtree = self.store(Node::Leaf { index, value });
                break;
            }
            if depth >= MAX_DEPTH {
                return Err(IdentityError::MaxDepthReached {
                    index: index.to_hex(),
                });
            }
            match self.node(&current)?.clone() {
                Node::Internal { left, right } => {
                    if index.bit(depth) {
                        siblings.push(left);
                        current = right;
                    } else {
                        siblings.push(right);
                        current = left;
                    }
                    depth += 1;
                }
                Node::Leaf {
                    index: other_index, ..
                } => {
                    if other_index == index {
                        return Err(IdentityError::DuplicateLeaf {
                            index: index.to_hex(),
                        });
                    }
                    subtree = self.split_leaves(index, value, other_index, current, depth)?;
                    break;
                }
            }
        }

        // Re-hash the traversed path back up to a new root.
        let mut acc = subtree;
        for level in (0..siblings.len()).rev() {
            let sibling = siblings[level];
            let (left, right) = if index.bit(level) {
                (sibling, acc)
            } else {
                (acc, sibling)
            };
            acc = self.store(Node::Internal { left, right });
        }

        self.root = acc;
        self.roots.insert(acc);
        self.leaf_count += 1;
        Ok(())
    }

    /// Generate an inclusion-or-exclusion proof for `index` against
    /// `root`, which may be any root this tree has ever had.
    pub fn prove(&self, index: &Digest, root: &Digest) -> Result<MerkleProof> {
        if !root.is_zero() && !self.roots.contains(root) {
            return Err(IdentityError::UnknownRoot {
                root: root.to_hex(),
            });
        }

        let mut siblings = Vec::new();
        let mut current = *root;
        let mut depth = 0usize;

        loop {
            if current.is_zero() {
                return Ok(MerkleProof {
                    existence: false,
                    siblings,
                    node_aux: None,
                });
            }
            match self.node(&current)? {
                Node::Internal { left, right } => {
                    if index.bit(depth) {
                        siblings.push(*left);
                        current = *right;
                    } else {
                        siblings.push(*right);
                        current = *left;
                    }
                    depth += 1;
                }
                Node::Leaf {
                    index: other_index,
                    value: other_value,
                } => {
                    if other_index == index {
                        return Ok(MerkleProof {
                            existence: true,
                            siblings,
                            node_aux: None,
                        });
                    }
                    return Ok(MerkleProof {
                        existence: false,
                        siblings,
                        node_aux: Some(NodeAux {
                            index: *other_index,
                            value: *other_value,
                        }),
                    });
                }
            }
        }
    }

    // Place a new leaf alongside an existing one that occupies its
    // slot, descending past their shared bit prefix.
    fn split_leaves(
        &mut self,
        index: Digest,
        value: Digest,
        other_index: Digest,
        other_leaf: Digest,
        depth: usize,
    ) -> Result<Digest> {
        let mut split = depth;
        while split < MAX_DEPTH && index.bit(split) == other_index.bit(split) {
            split += 1;
        }
        if split >= MAX_DEPTH {
            return Err(IdentityError::MaxDepthReached {
                index: index.to_hex(),
            });
        }

        let new_leaf = self.store(Node::Leaf { index, value });
        let (left, right) = if index.bit(split) {
            (other_leaf, new_leaf)
        } else {
            (new_leaf, other_leaf)
        };
        let mut acc = self.store(Node::Internal { left, right });

        // Shared-prefix levels get an empty sibling.
        for level in (depth..split).rev() {
            let (left, right) = if index.bit(level) {
                (Digest::ZERO, acc)
            } else {
                (acc, Digest::ZERO)
            };
            acc = self.store(Node::Internal { left, right });
        }
        Ok(acc)
    }

    fn store(&mut self, node: Node) -> Digest {
        let digest = node.digest();
        self.nodes.insert(digest, node);
        digest
    }

    fn node(&self, digest: &Digest) -> Result<&Node> {
        self.nodes.get(digest).ok_or(IdentityError::NodeMissing {
            hash: digest.to_hex(),
        })
    }
}
