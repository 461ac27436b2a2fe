//! The prover boundary.
//!
//! Proof generation is external: this crate assembles circuit inputs
//! and consumes finished proofs, but never runs a proving backend
//! itself. [`Prover`] is the seam — callers hand assembled inputs to an
//! implementation (an external process, a service, a test stub) and get
//! back a [`FullProof`] in the standard snarkjs shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::hash::Digest;
use crate::error::Result;
use crate::state::IdentityId;
use crate::transition::StateTransitionRecord;

/// Circuits this crate assembles inputs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitId {
    /// State transition: proves a mutation was authorized by the
    /// identity's auth claim at the old state.
    StateTransition,
    /// Atomic query by signature: proves a predicate over one slot of
    /// a signed claim without disclosing the rest.
    AtomicQuerySig,
}

impl CircuitId {
    /// The circuit's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            CircuitId::StateTransition => "stateTransition",
            CircuitId::AtomicQuerySig => "credentialAtomicQuerySig",
        }
    }
}

impl std::fmt::Display for CircuitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Assembled circuit inputs, keyed by signal name.
///
/// A `BTreeMap` keeps serialization order stable, so the same inputs
/// always produce byte-identical JSON for the proving backend.
pub type CircuitInputs = BTreeMap<String, serde_json::Value>;

/// A zero-knowledge proof in snarkjs shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    pub protocol: String,
    pub curve: String,
}

/// A proof together with its public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullProof {
    pub proof: ZkProof,
    pub pub_signals: Vec<String>,
}

/// A proving backend.
pub trait Prover {
    /// Produce a proof for `circuit` over the assembled `inputs`.
    ///
    /// Implementations report backend failures as
    /// [`crate::IdentityError::ProverFailed`]. Input assembly never
    /// checks whether the statement is true — a false predicate
    /// surfaces here, as an unsatisfiable witness.
    fn prove(&self, circuit: CircuitId, inputs: &CircuitInputs) -> Result<FullProof>;
}

/// The payload published to the state registry after a transition:
/// old and new state plus the proof authorizing the move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitStateCall {
    pub id: IdentityId,
    pub old_state: Digest,
    pub new_state: Digest,
    pub is_old_state_genesis: bool,
    pub proof: FullProof,
}

impl TransitStateCall {
    /// Pair a transition record with the proof generated from its
    /// circuit inputs.
    pub fn from_record(record: &StateTransitionRecord, proof: FullProof) -> Self {
        Self {
            id: record.id,
            old_state: record.old_tree_state.state,
            new_state: record.new_state,
            is_old_state_genesis: record.is_old_state_genesis,
            proof,
        }
    }
}
