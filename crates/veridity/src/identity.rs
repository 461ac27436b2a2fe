//! The identity: key pair, three trees, and the claims they anchor.
//!
//! An identity owns a claims tree, a revocation tree, and a roots tree.
//! Its state is the hash of the three roots; its identifier is derived
//! from the genesis state and fixed for life. All mutation goes through
//! the transition protocol in [`crate::transition`], one mutation per
//! transition. `&mut self` on the mutating methods is the concurrency
//! story: one writer, enforced at compile time.

use log::info;

use crate::claim::Claim;
use crate::crypto::hash::Digest;
use crate::crypto::keys::Ed25519KeyPair;
use crate::crypto::signing::sign_to_base64;
use crate::error::{IdentityError, Result};
use crate::proofs::inputs::AtomicQuerySignatureInputs;
use crate::proofs::{claim_proofs, ClaimProofBundle, ClaimProofs};
use crate::query::Query;
use crate::state::{IdentityId, TreeState};
use crate::time::now_secs;
use crate::transition::{execute, Mutation, StateTransitionRecord};
use crate::tree::AccumulatorTree;

/// A self-sovereign identity with its trees and claim stores.
pub struct Identity {
    pub(crate) key_pair: Ed25519KeyPair,
    pub(crate) id: IdentityId,
    /// Claims tree.
    pub(crate) clt: AccumulatorTree,
    /// Revocation tree.
    pub(crate) ret: AccumulatorTree,
    /// Historical-roots tree.
    pub(crate) rot: AccumulatorTree,
    pub(crate) auth_claim: Claim,
    claims: Vec<Claim>,
    received: Vec<ClaimProofBundle>,
    revoked_nonces: Vec<u64>,
}

impl Identity {
    /// Create a fresh identity: new key pair, auth claim with a random
    /// revocation nonce, identifier derived from the genesis state.
    pub fn new() -> Result<Self> {
        let key_pair = Ed25519KeyPair::generate();
        let auth_nonce: u64 = rand::random();
        let auth_claim = Claim::auth(&key_pair.verifying_key_bytes(), auth_nonce);

        let mut clt = AccumulatorTree::new();
        let (hi, hv) = auth_claim.hi_hv();
        clt.add(hi, hv)?;

        let ret = AccumulatorTree::new();
        let rot = AccumulatorTree::new();
        let genesis = TreeState::from_roots(clt.root(), ret.root(), rot.root());
        let id = IdentityId::genesis_from_state(&genesis.state);
        info!("created identity {id} at genesis state {}", genesis.state);

        Ok(Self {
            key_pair,
            id,
            clt,
            ret,
            rot,
            auth_claim,
            claims: Vec::new(),
            received: Vec::new(),
            revoked_nonces: Vec::new(),
        })
    }

    /// Rebuild an identity from persisted parts by replaying every
    /// mutation, then cross-checking identifier and state.
    pub(crate) fn restore(
        signing_key_bytes: &[u8; 32],
        stored_id: IdentityId,
        stored_state: Digest,
        auth_claim: Claim,
        claims: Vec<Claim>,
        received: Vec<ClaimProofBundle>,
        revoked_nonces: Vec<u64>,
    ) -> Result<Self> {
        let key_pair = Ed25519KeyPair::from_signing_key_bytes(signing_key_bytes)?;

        let mut clt = AccumulatorTree::new();
        let (hi, hv) = auth_claim.hi_hv();
        clt.add(hi, hv)?;
        let mut ret = AccumulatorTree::new();
        let mut rot = AccumulatorTree::new();

        let genesis = TreeState::from_roots(clt.root(), ret.root(), rot.root());
        let recomputed_id = IdentityId::genesis_from_state(&genesis.state);
        if recomputed_id != stored_id {
            return Err(IdentityError::IdMismatch {
                stored: stored_id.to_string(),
                recomputed: recomputed_id.to_string(),
            });
        }

        // Claim additions archive the pre-add claims root exactly as
        // the live transitions did; revocations never touch the roots
        // tree, so replaying them afterwards reproduces the same roots.
        for claim in &claims {
            let (hi, hv) = claim.hi_hv();
            rot.add(clt.root(), Digest::ZERO)?;
            clt.add(hi, hv)?;
        }
        for nonce in &revoked_nonces {
            ret.add(Digest::from_u64(*nonce), Digest::ZERO)?;
        }

        let replayed = TreeState::from_roots(clt.root(), ret.root(), rot.root());
        if replayed.state != stored_state {
            return Err(IdentityError::StateMismatch {
                stored: stored_state.to_hex(),
                recomputed: replayed.state.to_hex(),
            });
        }

        Ok(Self {
            key_pair,
            id: stored_id,
            clt,
            ret,
            rot,
            auth_claim,
            claims,
            received,
            revoked_nonces,
        })
    }

    /// The identifier.
    pub fn id(&self) -> IdentityId {
        self.id
    }

    /// The current identity state.
    pub fn state(&self) -> Digest {
        self.tree_state().state
    }

    /// Snapshot of the three roots and the state they hash to.
    pub fn tree_state(&self) -> TreeState {
        TreeState::from_roots(self.clt.root(), self.ret.root(), self.rot.root())
    }

    /// Whether the identity has never transitioned.
    pub fn is_at_genesis(&self) -> bool {
        self.id.is_genesis(&self.state())
    }

    /// The auth claim binding this identity's public key.
    pub fn auth_claim(&self) -> &Claim {
        &self.auth_claim
    }

    /// The public key bytes bound by the auth claim.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.key_pair.verifying_key_bytes()
    }

    /// Claims this identity holds in its own claims tree (the auth
    /// claim excluded).
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Revocation nonces inserted into the revocation tree.
    pub fn revoked_nonces(&self) -> &[u64] {
        &self.revoked_nonces
    }

    /// Add a claim through the transition protocol.
    pub fn add_claim(&mut self, claim: &Claim) -> Result<StateTransitionRecord> {
        let record = execute(self, Mutation::AddClaim(claim))?;
        self.claims.push(claim.clone());
        Ok(record)
    }

    /// Revoke a claim by nonce through the transition protocol.
    ///
    /// The auth claim's own nonce is not revocable: an identity with a
    /// revoked auth claim could never transition again, including out
    /// of that revocation.
    pub fn revoke(&mut self, nonce: u64) -> Result<StateTransitionRecord> {
        if nonce == self.auth_claim.revocation_nonce {
            return Err(IdentityError::MalformedClaim(
                "the auth claim nonce cannot be revoked".into(),
            ));
        }
        // A nonce already present surfaces as DuplicateLeaf from the
        // revocation tree, before anything is mutated.
        let record = execute(self, Mutation::Revoke(nonce))?;
        self.revoked_nonces.push(nonce);
        Ok(record)
    }

    /// Whether a nonce is present in the revocation tree.
    pub fn is_revoked(&self, nonce: u64) -> Result<bool> {
        Ok(self
            .ret
            .prove(&Digest::from_u64(nonce), &self.ret.root())?
            .existence)
    }

    /// The auth claim anchored at the current state.
    pub fn auth_claim_proofs(&self) -> Result<ClaimProofs> {
        claim_proofs(self, &self.auth_claim)
    }

    /// Store a bundle received from an issuer.
    pub fn store_bundle(&mut self, bundle: ClaimProofBundle) {
        self.received.push(bundle);
    }

    /// Bundles received from issuers.
    pub fn received(&self) -> &[ClaimProofBundle] {
        &self.received
    }

    /// The first received bundle matching a schema.
    pub fn find_received(&self, schema: &crate::claim::SchemaHash) -> Option<&ClaimProofBundle> {
        self.received
            .iter()
            .find(|b| b.proofs.claim.schema == *schema)
    }

    /// Assemble atomic-query inputs for a verifier challenge against
    /// the first received claim matching the query's schema.
    pub fn atomic_query_inputs(
        &self,
        challenge: Digest,
        query: &Query,
    ) -> Result<AtomicQuerySignatureInputs> {
        let bundle = self
            .find_received(&query.schema)
            .ok_or_else(|| IdentityError::ClaimNotFound(query.schema.to_hex()))?;

        Ok(AtomicQuerySignatureInputs {
            id: self.id,
            auth: self.auth_claim_proofs()?,
            challenge,
            challenge_signature: sign_to_base64(self.key_pair.signing_key(), &challenge),
            current_timestamp: now_secs(),
            claim: bundle.clone(),
            query: query.clone(),
        })
    }
}
