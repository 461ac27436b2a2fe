//! Circuit-input assembly for the atomic-query-by-signature circuit.
//!
//! Assembly is mechanical: it anchors the holder's auth claim, the
//! issuer's claim bundle, and the predicate into one flat signal map.
//! Whether the predicate is actually TRUE for the claim is not checked
//! here — a false statement simply yields an unsatisfiable witness at
//! the prover.

use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::crypto::hash::Digest;
use crate::proofs::{ClaimProofBundle, ClaimProofs};
use crate::prover::CircuitInputs;
use crate::query::Query;
use crate::state::IdentityId;
use crate::tree::{MerkleProof, MAX_DEPTH};

/// Fixed width of the comparison-value signal array.
pub const VALUE_ARRAY_LEN: usize = 64;

/// Assembled inputs for one atomic query: holder authentication,
/// issuer claim bundle, challenge, and predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicQuerySignatureInputs {
    pub id: IdentityId,
    /// The holder's auth claim anchored at the holder's current state.
    pub auth: ClaimProofs,
    /// Verifier-supplied challenge, bound into the proof.
    pub challenge: Digest,
    /// Base64 Ed25519 signature over the challenge by the holder key.
    pub challenge_signature: String,
    pub current_timestamp: i64,
    /// The issuer's claim bundle being queried.
    pub claim: ClaimProofBundle,
    pub query: Query,
}

impl AtomicQuerySignatureInputs {
    /// Flatten into the circuit's signal map.
    pub fn circuit_inputs(&self) -> CircuitInputs {
        let mut inputs = CircuitInputs::new();

        // Holder side.
        inputs.insert("userID".into(), serde_json::json!(self.id.to_string()));
        inputs.insert(
            "userState".into(),
            serde_json::json!(self.auth.tree_state.state.to_hex()),
        );
        inputs.insert(
            "userClaimsTreeRoot".into(),
            serde_json::json!(self.auth.tree_state.claims_root.to_hex()),
        );
        inputs.insert(
            "userRevTreeRoot".into(),
            serde_json::json!(self.auth.tree_state.revocation_root.to_hex()),
        );
        inputs.insert(
            "userRootsTreeRoot".into(),
            serde_json::json!(self.auth.tree_state.roots_root.to_hex()),
        );
        inputs.insert("authClaim".into(), claim_slots_json(&self.auth.claim));
        inputs.insert("authClaimMtp".into(), mtp_json(&self.auth.inclusion));
        inputs.insert(
            "authClaimNonRevMtp".into(),
            mtp_json(&self.auth.non_revocation),
        );
        push_non_rev_aux(&mut inputs, "authClaimNonRevMtp", &self.auth.non_revocation);
        inputs.insert("challenge".into(), serde_json::json!(self.challenge.to_hex()));
        inputs.insert(
            "challengeSignature".into(),
            serde_json::json!(self.challenge_signature),
        );

        // Issuer claim side.
        inputs.insert(
            "issuerID".into(),
            serde_json::json!(self.claim.issuer_id.to_string()),
        );
        inputs.insert(
            "issuerClaim".into(),
            claim_slots_json(&self.claim.proofs.claim),
        );
        inputs.insert(
            "issuerClaimMtp".into(),
            mtp_json(&self.claim.proofs.inclusion),
        );
        inputs.insert(
            "issuerClaimNonRevMtp".into(),
            mtp_json(&self.claim.proofs.non_revocation),
        );
        push_non_rev_aux(
            &mut inputs,
            "issuerClaimNonRevMtp",
            &self.claim.proofs.non_revocation,
        );
        inputs.insert(
            "issuerState".into(),
            serde_json::json!(self.claim.proofs.tree_state.state.to_hex()),
        );
        inputs.insert(
            "issuerClaimsTreeRoot".into(),
            serde_json::json!(self.claim.proofs.tree_state.claims_root.to_hex()),
        );
        inputs.insert(
            "issuerRevTreeRoot".into(),
            serde_json::json!(self.claim.proofs.tree_state.revocation_root.to_hex()),
        );
        inputs.insert(
            "issuerRootsTreeRoot".into(),
            serde_json::json!(self.claim.proofs.tree_state.roots_root.to_hex()),
        );

        // Issuer auth claim and signature.
        let issuer_auth = &self.claim.signature_proof.issuer_auth;
        inputs.insert(
            "issuerAuthClaim".into(),
            claim_slots_json(&issuer_auth.claim),
        );
        inputs.insert(
            "issuerAuthClaimMtp".into(),
            mtp_json(&issuer_auth.inclusion),
        );
        inputs.insert(
            "issuerAuthClaimNonRevMtp".into(),
            mtp_json(&issuer_auth.non_revocation),
        );
        push_non_rev_aux(
            &mut inputs,
            "issuerAuthClaimNonRevMtp",
            &issuer_auth.non_revocation,
        );
        inputs.insert(
            "issuerAuthState".into(),
            serde_json::json!(issuer_auth.tree_state.state.to_hex()),
        );
        inputs.insert(
            "issuerClaimSignature".into(),
            serde_json::json!(self.claim.signature_proof.signature),
        );

        // Predicate.
        inputs.insert(
            "claimSchema".into(),
            serde_json::json!(self.query.schema.to_hex()),
        );
        inputs.insert(
            "slotIndex".into(),
            serde_json::json!(self.query.slot_index),
        );
        inputs.insert(
            "operator".into(),
            serde_json::json!(self.query.operator.code()),
        );
        let mut values: Vec<String> = self
            .query
            .values
            .iter()
            .map(|v| hex::encode(v.0))
            .collect();
        values.resize(VALUE_ARRAY_LEN, hex::encode([0u8; 32]));
        inputs.insert("value".into(), serde_json::json!(values));
        inputs.insert(
            "timestamp".into(),
            serde_json::json!(self.current_timestamp),
        );

        inputs
    }
}

/// The claim's eight raw slot elements as hex strings, index group
/// first.
pub(crate) fn claim_slots_json(claim: &Claim) -> serde_json::Value {
    let (index_group, value_group) = claim.raw_slots();
    let slots: Vec<String> = index_group
        .iter()
        .chain(value_group.iter())
        .map(|d| d.to_hex())
        .collect();
    serde_json::json!(slots)
}

/// A Merkle path padded to the fixed circuit depth.
pub(crate) fn mtp_json(proof: &MerkleProof) -> serde_json::Value {
    let siblings: Vec<String> = proof
        .padded_siblings(MAX_DEPTH)
        .iter()
        .map(|d| d.to_hex())
        .collect();
    serde_json::json!(siblings)
}

/// The three auxiliary signals describing an exclusion proof's shape:
/// foreign-leaf index and value, or a no-aux marker when the path ends
/// at an empty slot.
pub(crate) fn push_non_rev_aux(inputs: &mut CircuitInputs, prefix: &str, proof: &MerkleProof) {
    let (aux_hi, aux_hv, no_aux) = match &proof.node_aux {
        Some(aux) => (aux.index.to_hex(), aux.value.to_hex(), "0"),
        None => (Digest::ZERO.to_hex(), Digest::ZERO.to_hex(), "1"),
    };
    inputs.insert(format!("{prefix}AuxHi"), serde_json::json!(aux_hi));
    inputs.insert(format!("{prefix}AuxHv"), serde_json::json!(aux_hv));
    inputs.insert(format!("{prefix}NoAux"), serde_json::json!(no_aux));
}
