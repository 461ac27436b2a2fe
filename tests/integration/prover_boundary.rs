//! Integration test: the prover boundary.
//!
//! The crate assembles circuit inputs and consumes finished proofs but
//! never proves anything itself. These tests drive the boundary with a
//! recording stub: they check that every signal a backend needs is
//! present and well-formed, and that assembly stays mechanical even
//! for predicates that are false for the underlying claim.

use std::cell::RefCell;

use veridity::crypto::hash::hash_bytes;
use veridity::{
    CircuitId, CircuitInputs, Claim, FullProof, Identity, IssuerLedger, Operator, Prover, Query,
    Result, SchemaHash, SlotValue, TransitStateCall, ZkProof, MAX_DEPTH,
};

/// A stub backend that records what it was asked to prove.
struct RecordingProver {
    calls: RefCell<Vec<(CircuitId, CircuitInputs)>>,
}

impl RecordingProver {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }

    fn canned_proof() -> FullProof {
        FullProof {
            proof: ZkProof {
                pi_a: vec!["1".into(), "2".into(), "1".into()],
                pi_b: vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]],
                pi_c: vec!["5".into(), "6".into(), "1".into()],
                protocol: "groth16".into(),
                curve: "bn128".into(),
            },
            pub_signals: vec!["0".into()],
        }
    }
}

impl Prover for RecordingProver {
    fn prove(&self, circuit: CircuitId, inputs: &CircuitInputs) -> Result<FullProof> {
        self.calls.borrow_mut().push((circuit, inputs.clone()));
        Ok(Self::canned_proof())
    }
}

fn age_schema() -> SchemaHash {
    SchemaHash::from_document(b"{\"type\": \"AgeCredential\"}", "AgeCredential")
}

#[test]
fn state_transition_inputs_reach_the_prover() {
    let mut identity = Identity::new().unwrap();
    let claim = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(19960424), SlotValue::ZERO)
        .revocation_nonce(7)
        .build()
        .unwrap();
    let record = identity.add_claim(&claim).unwrap();

    let prover = RecordingProver::new();
    let proof = prover
        .prove(CircuitId::StateTransition, &record.circuit_inputs())
        .unwrap();

    let calls = prover.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (circuit, inputs) = &calls[0];
    assert_eq!(*circuit, CircuitId::StateTransition);
    assert_eq!(circuit.name(), "stateTransition");

    for key in [
        "userID",
        "oldUserState",
        "newUserState",
        "isOldStateGenesis",
        "claimsTreeRoot",
        "revTreeRoot",
        "rootsTreeRoot",
        "authClaim",
        "authClaimMtp",
        "authClaimNonRevMtp",
        "authClaimNonRevMtpAuxHi",
        "authClaimNonRevMtpAuxHv",
        "authClaimNonRevMtpNoAux",
        "signature",
    ] {
        assert!(inputs.contains_key(key), "missing signal {key}");
    }
    assert_eq!(inputs["authClaimMtp"].as_array().unwrap().len(), MAX_DEPTH);

    // The published call pairs the record with the returned proof.
    let call = TransitStateCall::from_record(&record, proof);
    assert_eq!(call.id, identity.id());
    assert_eq!(call.old_state, record.old_tree_state.state);
    assert_eq!(call.new_state, record.new_state);
    assert!(call.is_old_state_genesis);
    assert_eq!(call.proof.proof.protocol, "groth16");
}

#[test]
fn atomic_query_inputs_reach_the_prover() {
    let mut issuer = IssuerLedger::new().unwrap();
    let mut holder = Identity::new().unwrap();
    let claim = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(19960424), SlotValue::ZERO)
        .revocation_nonce(7)
        .subject(holder.id())
        .build()
        .unwrap();
    let (_, bundle) = issuer.issue(&claim).unwrap();
    holder.store_bundle(bundle);

    let query = Query {
        schema: age_schema(),
        slot_index: 2,
        operator: Operator::Lt,
        values: vec![SlotValue::from_u64(20100101)],
    };
    let assembled = holder
        .atomic_query_inputs(hash_bytes(b"session"), &query)
        .unwrap();

    let prover = RecordingProver::new();
    prover
        .prove(CircuitId::AtomicQuerySig, &assembled.circuit_inputs())
        .unwrap();

    let calls = prover.calls.borrow();
    let (circuit, inputs) = &calls[0];
    assert_eq!(circuit.name(), "credentialAtomicQuerySig");

    for key in [
        "userID",
        "userState",
        "authClaim",
        "challenge",
        "challengeSignature",
        "issuerID",
        "issuerClaim",
        "issuerClaimMtp",
        "issuerAuthClaim",
        "issuerClaimSignature",
        "claimSchema",
        "slotIndex",
        "operator",
        "value",
        "timestamp",
    ] {
        assert!(inputs.contains_key(key), "missing signal {key}");
    }
}

#[test]
fn false_predicate_still_assembles_inputs() {
    // Truth is the circuit's concern: a holder born in 2015 can still
    // ask for a "born before 2010" proof, and assembly must not stop
    // them — the witness just won't satisfy the circuit.
    let mut issuer = IssuerLedger::new().unwrap();
    let mut holder = Identity::new().unwrap();
    let claim = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(20150101), SlotValue::ZERO)
        .revocation_nonce(7)
        .subject(holder.id())
        .build()
        .unwrap();
    let (_, bundle) = issuer.issue(&claim).unwrap();
    holder.store_bundle(bundle);

    let query = Query {
        schema: age_schema(),
        slot_index: 2,
        operator: Operator::Lt,
        values: vec![SlotValue::from_u64(20100101)],
    };
    assert!(!query
        .matches(&holder.received()[0].proofs.claim)
        .unwrap());

    let assembled = holder
        .atomic_query_inputs(hash_bytes(b"session"), &query)
        .unwrap();
    let inputs = assembled.circuit_inputs();
    assert_eq!(inputs["operator"], serde_json::json!(2));
}

#[test]
fn deterministic_inputs_serialize_identically() {
    let mut identity = Identity::new().unwrap();
    let claim = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(1), SlotValue::ZERO)
        .revocation_nonce(1)
        .build()
        .unwrap();
    let record = identity.add_claim(&claim).unwrap();

    let a = serde_json::to_string(&record.circuit_inputs()).unwrap();
    let b = serde_json::to_string(&record.circuit_inputs()).unwrap();
    assert_eq!(a, b);
}
