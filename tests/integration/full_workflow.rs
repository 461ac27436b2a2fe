//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Create identities and verify genesis invariants
//! 2. Issue a claim from issuer to holder through a state transition
//! 3. Verify the issued bundle offline
//! 4. Assemble an atomic-query proof for a verifier challenge
//! 5. Revoke the claim and observe non-revocation proofs fail

use veridity::crypto::hash::{hash_bytes, Digest};
use veridity::{
    claim_proofs, compute_state, verify_bundle, AccumulatorTree, Claim, Identity, IdentityError,
    IssuerLedger, Operator, Query, SchemaHash, SlotValue,
};

fn age_schema() -> SchemaHash {
    SchemaHash::from_document(b"{\"type\": \"AgeCredential\"}", "AgeCredential")
}

fn age_claim(subject: veridity::IdentityId, birthday: u64, nonce: u64) -> Claim {
    Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(birthday), SlotValue::ZERO)
        .revocation_nonce(nonce)
        .subject(subject)
        .build()
        .unwrap()
}

#[test]
fn full_workflow_issue_query_revoke() {
    // ── Step 1: Create identities ───────────────────────────────────────
    let mut issuer = IssuerLedger::new().unwrap();
    let mut holder = Identity::new().unwrap();

    assert_ne!(issuer.id(), holder.id());
    assert!(holder.is_at_genesis());
    assert!(issuer.identity().is_at_genesis());

    // ── Step 2: Issue a birthday claim to the holder ─────────────────────
    let claim = age_claim(holder.id(), 19960424, 7);
    let (record, bundle) = issuer.issue(&claim).unwrap();

    assert!(record.is_old_state_genesis);
    assert!(!issuer.identity().is_at_genesis());
    assert_eq!(issuer.bundles_for(&holder.id()).len(), 1);
    assert_eq!(bundle.issuer_id, issuer.id());

    // ── Step 3: Holder verifies and stores the bundle ─────────────────────
    verify_bundle(&bundle).unwrap();
    holder.store_bundle(bundle);

    // ── Step 4: Answer a verifier query ───────────────────────────────────
    let query = Query {
        schema: age_schema(),
        slot_index: 2,
        operator: Operator::Lt,
        values: vec![SlotValue::from_u64(20100101)],
    };
    let stored = holder.find_received(&age_schema()).unwrap();
    assert!(query.matches(&stored.proofs.claim).unwrap());

    let challenge = hash_bytes(b"verifier session 1");
    let assembled = holder.atomic_query_inputs(challenge, &query).unwrap();
    let inputs = assembled.circuit_inputs();
    assert_eq!(inputs["operator"], serde_json::json!(2));
    assert_eq!(
        inputs["issuerID"],
        serde_json::json!(issuer.id().to_string())
    );

    // ── Step 5: Revoke and observe proofs fail ────────────────────────────
    issuer.revoke(7).unwrap();
    let err = claim_proofs(issuer.identity(), &claim).unwrap_err();
    assert!(matches!(err, IdentityError::ClaimRevoked(7)));
}

#[test]
fn state_is_always_hash_of_three_roots() {
    let mut identity = Identity::new().unwrap();
    for nonce in 1..=10u64 {
        let claim = Claim::builder(age_schema())
            .index_data(SlotValue::from_u64(19000000 + nonce), SlotValue::ZERO)
            .revocation_nonce(nonce)
            .build()
            .unwrap();
        identity.add_claim(&claim).unwrap();

        let ts = identity.tree_state();
        assert_eq!(
            ts.state,
            compute_state(&ts.claims_root, &ts.revocation_root, &ts.roots_root)
        );
    }
    identity.revoke(3).unwrap();
    identity.revoke(5).unwrap();
    let ts = identity.tree_state();
    assert_eq!(
        ts.state,
        compute_state(&ts.claims_root, &ts.revocation_root, &ts.roots_root)
    );
}

#[test]
fn roots_tree_archives_every_superseded_claims_root() {
    let mut identity = Identity::new().unwrap();
    let mut expected_rot = AccumulatorTree::new();

    for nonce in 1..=6u64 {
        // The claims root about to be superseded.
        expected_rot
            .add(identity.tree_state().claims_root, Digest::ZERO)
            .unwrap();

        let claim = Claim::builder(age_schema())
            .index_data(SlotValue::from_u64(nonce), SlotValue::ZERO)
            .revocation_nonce(nonce)
            .build()
            .unwrap();
        identity.add_claim(&claim).unwrap();

        // The roots tree holds exactly the superseded claims roots —
        // never the current one.
        assert_eq!(identity.tree_state().roots_root, expected_rot.root());
        let current = identity.tree_state().claims_root;
        let probe = expected_rot.prove(&current, &expected_rot.root()).unwrap();
        assert!(probe.is_exclusion());
    }

    // Revocations leave the roots tree untouched.
    identity.revoke(2).unwrap();
    assert_eq!(identity.tree_state().roots_root, expected_rot.root());
}

#[test]
fn holder_without_matching_claim_cannot_assemble() {
    let holder = Identity::new().unwrap();
    let err = holder
        .atomic_query_inputs(hash_bytes(b"c"), &Query::noop(age_schema()))
        .unwrap_err();
    assert!(matches!(err, IdentityError::ClaimNotFound(_)));
}

#[test]
fn two_holders_one_issuer() {
    let mut issuer = IssuerLedger::new().unwrap();
    let h1 = Identity::new().unwrap();
    let h2 = Identity::new().unwrap();

    issuer.issue(&age_claim(h1.id(), 19960424, 7)).unwrap();
    assert_eq!(issuer.bundles_for(&h1.id()).len(), 1);
    assert!(issuer.bundles_for(&h2.id()).is_empty());

    // Earlier bundles must survive later issuer activity.
    issuer.issue(&age_claim(h2.id(), 20000101, 8)).unwrap();

    verify_bundle(&issuer.bundles_for(&h1.id())[0]).unwrap();
    verify_bundle(&issuer.bundles_for(&h2.id())[0]).unwrap();
}

#[test]
fn transition_signatures_bind_old_and_new_state() {
    let mut identity = Identity::new().unwrap();
    let claim = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(19960424), SlotValue::ZERO)
        .revocation_nonce(7)
        .build()
        .unwrap();
    let record = identity.add_claim(&claim).unwrap();

    let key = veridity::crypto::keys::Ed25519KeyPair::verifying_key_from_bytes(
        &identity.verifying_key_bytes(),
    )
    .unwrap();
    assert!(record.verify_signature(&key).is_ok());

    let mut tampered = record;
    tampered.new_state = Digest::from_u64(1);
    assert!(tampered.verify_signature(&key).is_err());
}
