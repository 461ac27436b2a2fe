//! The issuer ledger: issuance bookkeeping per subject.
//!
//! Wraps an [`Identity`] acting as an issuer. Every issued claim goes
//! through the identity's transition protocol and the resulting bundle
//! is filed under the subject, so a holder can ask for "everything
//! issued to me" without the issuer re-proving from scratch.

use std::collections::HashMap;

use log::info;

use crate::claim::Claim;
use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use crate::proofs::{issue_bundle, ClaimProofBundle};
use crate::state::IdentityId;
use crate::transition::StateTransitionRecord;

/// An issuing identity plus its per-subject issuance index.
pub struct IssuerLedger {
    identity: Identity,
    issued: HashMap<IdentityId, Vec<ClaimProofBundle>>,
}

impl IssuerLedger {
    /// Wrap a fresh identity as an issuer.
    pub fn new() -> Result<Self> {
        Ok(Self {
            identity: Identity::new()?,
            issued: HashMap::new(),
        })
    }

    /// Wrap an existing identity as an issuer.
    pub fn from_identity(identity: Identity) -> Self {
        Self {
            identity,
            issued: HashMap::new(),
        }
    }

    /// The underlying issuing identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The issuer's identifier.
    pub fn id(&self) -> IdentityId {
        self.identity.id()
    }

    /// Issue a claim: add it to the issuer's claims tree through a
    /// state transition, build the proof bundle, and file it under the
    /// claim's subject.
    ///
    /// The claim must name a subject; an issuer has no business filing
    /// subject-less claims.
    pub fn issue(&mut self, claim: &Claim) -> Result<(StateTransitionRecord, ClaimProofBundle)> {
        let subject = claim.subject.ok_or_else(|| {
            IdentityError::MalformedClaim("issued claims must name a subject".into())
        })?;

        let record = self.identity.add_claim(claim)?;
        let bundle = issue_bundle(&self.identity, claim)?;
        self.issued.entry(subject).or_default().push(bundle.clone());
        info!(
            "issued claim schema={} nonce={} to subject {subject}",
            claim.schema, claim.revocation_nonce
        );
        Ok((record, bundle))
    }

    /// Everything issued to a subject. Empty for unknown subjects.
    pub fn bundles_for(&self, subject: &IdentityId) -> &[ClaimProofBundle] {
        self.issued.get(subject).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Revoke an issued claim by nonce.
    pub fn revoke(&mut self, nonce: u64) -> Result<StateTransitionRecord> {
        self.identity.revoke(nonce)
    }
}
