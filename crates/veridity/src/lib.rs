//! Veridity — self-sovereign identity state engine.
//!
//! Provides the three-tree Merkle accumulator (claims, revocation,
//! historical roots), deterministic identity-state and identifier
//! derivation, the claim-mutation state-transition protocol, issuance
//! by signature, selective-disclosure query matching, circuit-input
//! assembly for an external prover, and encrypted snapshot persistence.

pub mod claim;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod proofs;
pub mod prover;
pub mod query;
pub mod state;
pub mod storage;
pub mod time;
pub mod transition;
pub mod tree;

// Re-export primary types
pub use error::{IdentityError, Result};
pub use identity::Identity;
pub use state::{compute_state, IdentityId, TreeState};

// Re-export claim types
pub use claim::{Claim, ClaimBuilder, SchemaHash, SlotValue, AUTH_SCHEMA};

// Re-export tree types
pub use tree::{AccumulatorTree, MerkleProof, NodeAux, MAX_DEPTH};

// Re-export proof and transition types
pub use proofs::{
    claim_proofs, issue_bundle, verify_bundle, AtomicQuerySignatureInputs, ClaimProofBundle,
    ClaimProofs, IssuerSignatureProof,
};
pub use transition::StateTransitionRecord;

// Re-export query, ledger, prover, and storage types
pub use ledger::IssuerLedger;
pub use prover::{CircuitId, CircuitInputs, FullProof, Prover, TransitStateCall, ZkProof};
pub use query::{Operator, Query};
pub use storage::{load_snapshot, read_account, save_snapshot, Account, VidFile};
