//! The claim-mutation state transition.
//!
//! Every mutation runs the same five phases: snapshot the old tree
//! state and prove the auth claim valid against it, archive the old
//! claims root (additions only), apply the mutation, sign the
//! old-to-new state pair, and emit a [`StateTransitionRecord`] the
//! caller can turn into circuit inputs for the external prover.
//!
//! The auth proofs are taken against the OLD roots on purpose: the
//! circuit checks that whoever moved the state was authorized under
//! the state being left, not the one being entered.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::claim::{Claim, AUTH_SCHEMA};
use crate::crypto::hash::{hash_elems, Digest};
use crate::crypto::signing::{sign_to_base64, verify_from_base64};
use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use crate::proofs::inputs::{claim_slots_json, mtp_json, push_non_rev_aux};
use crate::prover::CircuitInputs;
use crate::state::{IdentityId, TreeState};
use crate::tree::MerkleProof;

/// A mutation applied through the transition protocol.
pub(crate) enum Mutation<'a> {
    AddClaim(&'a Claim),
    Revoke(u64),
}

/// Everything a prover needs to attest one state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransitionRecord {
    pub id: IdentityId,
    pub old_tree_state: TreeState,
    pub new_state: Digest,
    pub is_old_state_genesis: bool,
    pub auth_claim: Claim,
    /// Inclusion of the auth claim in the OLD claims tree.
    pub auth_inclusion: MerkleProof,
    /// Exclusion of the auth nonce from the OLD revocation tree.
    pub auth_non_revocation: MerkleProof,
    /// Base64 Ed25519 signature over the transition digest.
    pub signature: String,
}

impl StateTransitionRecord {
    /// The digest the transition signature covers:
    /// `hash(old state, new state)`.
    pub fn transition_digest(old_state: &Digest, new_state: &Digest) -> Digest {
        hash_elems(&[old_state, new_state])
    }

    /// Verify the transition signature against a verifying key.
    pub fn verify_signature(&self, verifying_key: &ed25519_dalek::VerifyingKey) -> Result<()> {
        let digest = Self::transition_digest(&self.old_tree_state.state, &self.new_state);
        verify_from_base64(verifying_key, &digest, &self.signature)
    }

    /// Assemble the state-transition circuit inputs.
    pub fn circuit_inputs(&self) -> CircuitInputs {
        let mut inputs = CircuitInputs::new();
        inputs.insert("userID".into(), serde_json::json!(self.id.to_string()));
        inputs.insert(
            "oldUserState".into(),
            serde_json::json!(self.old_tree_state.state.to_hex()),
        );
        inputs.insert(
            "newUserState".into(),
            serde_json::json!(self.new_state.to_hex()),
        );
        inputs.insert(
            "isOldStateGenesis".into(),
            serde_json::json!(if self.is_old_state_genesis { "1" } else { "0" }),
        );
        inputs.insert(
            "claimsTreeRoot".into(),
            serde_json::json!(self.old_tree_state.claims_root.to_hex()),
        );
        inputs.insert(
            "revTreeRoot".into(),
            serde_json::json!(self.old_tree_state.revocation_root.to_hex()),
        );
        inputs.insert(
            "rootsTreeRoot".into(),
            serde_json::json!(self.old_tree_state.roots_root.to_hex()),
        );
        inputs.insert("authClaim".into(), claim_slots_json(&self.auth_claim));
        inputs.insert("authClaimMtp".into(), mtp_json(&self.auth_inclusion));
        inputs.insert(
            "authClaimNonRevMtp".into(),
            mtp_json(&self.auth_non_revocation),
        );
        push_non_rev_aux(&mut inputs, "authClaimNonRevMtp", &self.auth_non_revocation);
        inputs.insert("signature".into(), serde_json::json!(self.signature));
        inputs
    }
}

/// Run one mutation through the transition protocol.
///
/// Validation failures before the first tree write are side-effect
/// free. Failures after it leave the identity poisoned (see
/// [`IdentityError::poisons_identity`]); the caller must reload.
pub(crate) fn execute(identity: &mut Identity, mutation: Mutation<'_>) -> Result<StateTransitionRecord> {
    let old = identity.tree_state();
    let is_old_state_genesis = identity.id().is_genesis(&old.state);

    // Auth proofs against the old roots, before anything moves.
    let (auth_hi, _) = identity.auth_claim.hi_hv();
    let auth_inclusion = identity.clt.prove(&auth_hi, &old.claims_root)?;
    if !auth_inclusion.existence {
        return Err(IdentityError::ClaimNotFound(AUTH_SCHEMA.to_hex()));
    }
    let auth_non_revocation = identity
        .ret
        .prove(&identity.auth_claim.revocation_index(), &old.revocation_root)?;
    if auth_non_revocation.existence {
        return Err(IdentityError::MalformedClaim(
            "auth claim is revoked; identity can no longer transition".into(),
        ));
    }

    match mutation {
        Mutation::AddClaim(claim) => {
            let (hi, hv) = claim.hi_hv();
            // Duplicate check first, so the roots tree is untouched on
            // rejection.
            if identity.clt.prove(&hi, &old.claims_root)?.existence {
                return Err(IdentityError::DuplicateLeaf {
                    index: hi.to_hex(),
                });
            }
            identity.rot.add(old.claims_root, Digest::ZERO)?;
            identity.clt.add(hi, hv)?;
        }
        Mutation::Revoke(nonce) => {
            identity.ret.add(Digest::from_u64(nonce), Digest::ZERO)?;
        }
    }

    let new = identity.tree_state();
    let digest = StateTransitionRecord::transition_digest(&old.state, &new.state);
    let signature = sign_to_base64(identity.key_pair.signing_key(), &digest);

    debug!(
        "transition committed: id={} old_state={} new_state={} genesis={}",
        identity.id(),
        old.state,
        new.state,
        is_old_state_genesis
    );

    Ok(StateTransitionRecord {
        id: identity.id(),
        old_tree_state: old,
        new_state: new.state,
        is_old_state_genesis,
        auth_claim: identity.auth_claim.clone(),
        auth_inclusion,
        auth_non_revocation,
        signature,
    })
}
