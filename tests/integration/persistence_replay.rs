//! Integration test: snapshot persistence and replay consistency.
//!
//! A loaded identity must be indistinguishable from the one saved:
//! same identifier, same state, same trees, same proof behavior. Any
//! divergence (tampering, corruption) must be rejected at load time.

use tempfile::tempdir;

use veridity::crypto::hash::hash_bytes;
use veridity::storage::{load_snapshot, read_account, save_snapshot, VidFile};
use veridity::{
    verify_bundle, Claim, Identity, IdentityError, IssuerLedger, Query, SchemaHash, SlotValue,
};

fn age_schema() -> SchemaHash {
    SchemaHash::from_document(b"{\"type\": \"AgeCredential\"}", "AgeCredential")
}

fn populated_holder() -> Identity {
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

    let own = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(1), SlotValue::ZERO)
        .revocation_nonce(1)
        .build()
        .unwrap();
    holder.add_claim(&own).unwrap();
    holder
}

#[test]
fn roundtrip_preserves_id_and_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    let holder = populated_holder();

    save_snapshot(&holder, &path, "passphrase").unwrap();
    let loaded = load_snapshot(&path, "passphrase").unwrap();

    assert_eq!(loaded.id(), holder.id());
    assert_eq!(loaded.state(), holder.state());
    assert_eq!(loaded.tree_state(), holder.tree_state());
    assert_eq!(loaded.claims().len(), holder.claims().len());
    assert_eq!(loaded.received().len(), 1);
}

#[test]
fn loaded_identity_keeps_working() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    save_snapshot(&populated_holder(), &path, "pw").unwrap();

    let mut loaded = load_snapshot(&path, "pw").unwrap();

    // Stored bundles still verify and still answer queries.
    verify_bundle(&loaded.received()[0]).unwrap();
    let assembled = loaded
        .atomic_query_inputs(hash_bytes(b"challenge"), &Query::noop(age_schema()))
        .unwrap();
    assert_eq!(assembled.id, loaded.id());

    // And the identity can still transition with the restored key.
    let more = Claim::builder(age_schema())
        .index_data(SlotValue::from_u64(2), SlotValue::ZERO)
        .revocation_nonce(2)
        .build()
        .unwrap();
    let record = loaded.add_claim(&more).unwrap();
    assert!(!record.is_old_state_genesis);
}

#[test]
fn wrong_passphrase_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    save_snapshot(&populated_holder(), &path, "correct").unwrap();

    assert!(matches!(
        load_snapshot(&path, "nope"),
        Err(IdentityError::InvalidPassphrase)
    ));
}

#[test]
fn tampered_account_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    save_snapshot(&populated_holder(), &path, "pw").unwrap();

    // Swap in a different identifier: replay recomputes the genesis
    // identifier from the auth claim and must notice.
    let other = Identity::new().unwrap();
    let json = std::fs::read_to_string(&path).unwrap();
    let mut file: VidFile = serde_json::from_str(&json).unwrap();
    file.account.id = other.id();
    std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

    assert!(matches!(
        load_snapshot(&path, "pw"),
        Err(IdentityError::IdMismatch { .. })
    ));
}

#[test]
fn injected_claim_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    save_snapshot(&populated_holder(), &path, "pw").unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    let mut file: VidFile = serde_json::from_str(&json).unwrap();
    file.account.claims.push(
        Claim::builder(age_schema())
            .index_data(SlotValue::from_u64(99), SlotValue::ZERO)
            .revocation_nonce(99)
            .build()
            .unwrap(),
    );
    std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

    // The stored state no longer matches the replayed trees.
    assert!(matches!(
        load_snapshot(&path, "pw"),
        Err(IdentityError::StateMismatch { .. })
    ));
}

#[test]
fn account_readable_without_passphrase() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    let holder = populated_holder();
    save_snapshot(&holder, &path, "pw").unwrap();

    let account = read_account(&path).unwrap();
    assert_eq!(account.id, holder.id());
    assert_eq!(account.state, holder.state());
    assert_eq!(account.revoked_nonces.len(), 0);
}

#[test]
fn save_is_atomic_over_existing_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("holder.vid");
    let mut holder = populated_holder();
    save_snapshot(&holder, &path, "pw").unwrap();

    // Overwrite with a newer state; the file must parse cleanly and
    // reflect exactly the newer snapshot.
    holder.revoke(1).unwrap();
    save_snapshot(&holder, &path, "pw").unwrap();

    let loaded = load_snapshot(&path, "pw").unwrap();
    assert_eq!(loaded.state(), holder.state());
    assert_eq!(loaded.revoked_nonces(), &[1]);
    assert!(!path.with_extension("vid.tmp").exists());
}
