//! Proof assembly over claims.
//!
//! - [`ClaimProofs`] — a claim plus its inclusion and non-revocation
//!   Merkle proofs, anchored to one tree state.
//! - [`signature`] — issuer-signed claims and the bundles holders
//!   store.
//! - [`inputs`] — circuit-input assembly for the atomic-query circuit.

pub mod inputs;
pub mod signature;

pub use inputs::AtomicQuerySignatureInputs;
pub use signature::{issue_bundle, verify_bundle, ClaimProofBundle, IssuerSignatureProof};

use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::crypto::hash::Digest;
use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use crate::state::{compute_state, TreeState};
use crate::tree::MerkleProof;

/// A claim anchored to a tree state: inclusion in the claims tree and
/// non-revocation in the revocation tree, both against the same
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimProofs {
    pub claim: Claim,
    pub inclusion: MerkleProof,
    pub non_revocation: MerkleProof,
    pub tree_state: TreeState,
}

impl ClaimProofs {
    /// Verify both proofs against the embedded tree state, and the
    /// tree state against its own roots.
    pub fn verify(&self) -> Result<()> {
        let recomputed = compute_state(
            &self.tree_state.claims_root,
            &self.tree_state.revocation_root,
            &self.tree_state.roots_root,
        );
        if recomputed != self.tree_state.state {
            return Err(IdentityError::StateMismatch {
                stored: self.tree_state.state.to_hex(),
                recomputed: recomputed.to_hex(),
            });
        }

        let (hi, hv) = self.claim.hi_hv();
        if !self.inclusion.existence
            || !self.inclusion.verify(&self.tree_state.claims_root, &hi, &hv)
        {
            return Err(IdentityError::ClaimNotFound(self.claim.schema.to_hex()));
        }

        if self.non_revocation.existence
            || !self.non_revocation.verify(
                &self.tree_state.revocation_root,
                &self.claim.revocation_index(),
                &Digest::ZERO,
            )
        {
            return Err(IdentityError::ClaimRevoked(self.claim.revocation_nonce));
        }

        Ok(())
    }
}

/// Build [`ClaimProofs`] for a claim in `identity`'s trees at its
/// current state.
pub fn claim_proofs(identity: &Identity, claim: &Claim) -> Result<ClaimProofs> {
    let tree_state = identity.tree_state();
    let (hi, _) = claim.hi_hv();

    let inclusion = identity.clt.prove(&hi, &tree_state.claims_root)?;
    if !inclusion.existence {
        return Err(IdentityError::ClaimNotFound(claim.schema.to_hex()));
    }

    let non_revocation = identity
        .ret
        .prove(&claim.revocation_index(), &tree_state.revocation_root)?;
    if non_revocation.existence {
        return Err(IdentityError::ClaimRevoked(claim.revocation_nonce));
    }

    Ok(ClaimProofs {
        claim: claim.clone(),
        inclusion,
        non_revocation,
        tree_state,
    })
}
