//! Issuance by signature.
//!
//! An issuer signs the claim digest with the key bound in its own auth
//! claim, and ships the auth claim's proofs alongside so a verifier can
//! check the key really belongs to the issuer's state. The holder
//! stores the resulting [`ClaimProofBundle`] and later feeds it into
//! atomic-query input assembly.

use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::signing::{sign_to_base64, verify_from_base64};
use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use crate::proofs::{claim_proofs, ClaimProofs};
use crate::state::IdentityId;

/// An issuer's signature over a claim digest, with the auth-claim
/// proofs that bind the signing key to the issuer's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSignatureProof {
    pub issuer_id: IdentityId,
    pub issuer_auth: ClaimProofs,
    /// Base64 Ed25519 signature over the issued claim's digest.
    pub signature: String,
}

/// What a holder stores per received claim: the claim anchored in the
/// issuer's trees, plus the issuer's signature proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimProofBundle {
    pub issuer_id: IdentityId,
    pub proofs: ClaimProofs,
    pub signature_proof: IssuerSignatureProof,
}

/// Sign `claim` with the issuer's key and attach the issuer's
/// auth-claim proofs at its current state.
pub fn issuer_signature_proof(issuer: &Identity, claim: &Claim) -> Result<IssuerSignatureProof> {
    let issuer_auth = claim_proofs(issuer, &issuer.auth_claim)?;
    let signature = sign_to_base64(issuer.key_pair.signing_key(), &claim.digest());
    Ok(IssuerSignatureProof {
        issuer_id: issuer.id(),
        issuer_auth,
        signature,
    })
}

/// Assemble the full bundle for a claim already added to the issuer's
/// claims tree.
pub fn issue_bundle(issuer: &Identity, claim: &Claim) -> Result<ClaimProofBundle> {
    Ok(ClaimProofBundle {
        issuer_id: issuer.id(),
        proofs: claim_proofs(issuer, claim)?,
        signature_proof: issuer_signature_proof(issuer, claim)?,
    })
}

/// Verify a bundle without access to the issuer: Merkle proofs against
/// the embedded tree states, and the signature against the key bound
/// in the issuer's auth claim.
pub fn verify_bundle(bundle: &ClaimProofBundle) -> Result<()> {
    bundle.proofs.verify()?;
    bundle.signature_proof.issuer_auth.verify()?;

    if bundle.signature_proof.issuer_id != bundle.issuer_id {
        return Err(IdentityError::InvalidIdentifier(format!(
            "signature proof names issuer {}, bundle names {}",
            bundle.signature_proof.issuer_id, bundle.issuer_id
        )));
    }

    let key_bytes = bundle
        .signature_proof
        .issuer_auth
        .claim
        .auth_public_key()
        .ok_or_else(|| {
            IdentityError::MalformedClaim("issuer auth proof carries a non-auth claim".into())
        })?;
    let verifying_key = Ed25519KeyPair::verifying_key_from_bytes(&key_bytes)?;

    verify_from_base64(
        &verifying_key,
        &bundle.proofs.claim.digest(),
        &bundle.signature_proof.signature,
    )
}
