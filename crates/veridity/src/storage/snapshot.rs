//! The `.vid` snapshot file format.
//!
//! Layout: a JSON envelope with a format tag, encryption metadata, the
//! sealed signing key, and the plaintext [`Account`]. Only the signing
//! key is secret; everything else in the account is either public or
//! derivable from public data. Writes go through a temp file and
//! rename, so a crash mid-save never truncates an existing snapshot.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::claim::Claim;
use crate::crypto::derivation::{derive_key, snapshot_context};
use crate::crypto::encryption::{derive_passphrase_key, open, random_salt, seal};
use crate::crypto::hash::Digest;
use crate::error::{IdentityError, Result};
use crate::identity::Identity;
use crate::proofs::ClaimProofBundle;
use crate::state::IdentityId;

/// Current snapshot format version.
pub const VID_VERSION: u32 = 1;
/// Format tag in the envelope.
pub const VID_FORMAT: &str = "vid-v1";

/// The plaintext, replayable record of an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: IdentityId,
    pub state: Digest,
    pub claims_root: Digest,
    pub revocation_root: Digest,
    pub roots_root: Digest,
    pub auth_claim: Claim,
    pub claims: Vec<Claim>,
    pub received: Vec<ClaimProofBundle>,
    pub revoked_nonces: Vec<u64>,
}

impl Account {
    /// Capture an identity's public record.
    pub fn from_identity(identity: &Identity) -> Self {
        let ts = identity.tree_state();
        Self {
            id: identity.id(),
            state: ts.state,
            claims_root: ts.claims_root,
            revocation_root: ts.revocation_root,
            roots_root: ts.roots_root,
            auth_claim: identity.auth_claim().clone(),
            claims: identity.claims().to_vec(),
            received: identity.received().to_vec(),
            revoked_nonces: identity.revoked_nonces().to_vec(),
        }
    }
}

/// Encryption metadata stored alongside the sealed key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionMeta {
    pub algorithm: String,
    pub kdf: String,
    /// Hex-encoded Argon2id salt.
    pub salt: String,
    /// Hex-encoded AEAD nonce.
    pub nonce: String,
}

/// The on-disk snapshot envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VidFile {
    pub version: u32,
    pub format: String,
    pub encryption: EncryptionMeta,
    /// Base64-encoded sealed signing key.
    pub encrypted_key: String,
    pub account: Account,
}

/// Save an identity to `path`, sealing the signing key under
/// `passphrase`.
pub fn save_snapshot(identity: &Identity, path: &Path, passphrase: &str) -> Result<()> {
    let salt = random_salt();
    let mut master = derive_passphrase_key(passphrase.as_bytes(), &salt)?;
    let mut enc_key = derive_key(&master, &snapshot_context())?;
    master.zeroize();

    let mut signing_key = identity.key_pair.signing_key_bytes();
    let sealed = seal(&enc_key, &signing_key);
    signing_key.zeroize();
    enc_key.zeroize();
    let (nonce, ciphertext) = sealed?;

    let file = VidFile {
        version: VID_VERSION,
        format: VID_FORMAT.to_string(),
        encryption: EncryptionMeta {
            algorithm: "chacha20-poly1305".to_string(),
            kdf: "argon2id".to_string(),
            salt: hex::encode(salt),
            nonce: hex::encode(nonce),
        },
        encrypted_key: base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            ciphertext,
        ),
        account: Account::from_identity(identity),
    };

    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| IdentityError::SerializationError(format!("snapshot encode: {e}")))?;

    // Temp file + rename keeps the previous snapshot intact if the
    // write dies partway.
    let tmp = path.with_extension("vid.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    info!("saved snapshot for {} to {}", identity.id(), path.display());
    Ok(())
}

/// Load an identity from a snapshot, replaying all mutations and
/// verifying identifier and state consistency.
pub fn load_snapshot(path: &Path, passphrase: &str) -> Result<Identity> {
    let file = parse_vid_file(path)?;

    let salt_raw = hex::decode(&file.encryption.salt)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("bad salt hex: {e}")))?;
    let salt: [u8; 16] = salt_raw
        .try_into()
        .map_err(|_| IdentityError::InvalidFileFormat("salt must be 16 bytes".into()))?;
    let nonce_raw = hex::decode(&file.encryption.nonce)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("bad nonce hex: {e}")))?;
    let nonce: [u8; 12] = nonce_raw
        .try_into()
        .map_err(|_| IdentityError::InvalidFileFormat("nonce must be 12 bytes".into()))?;
    let ciphertext =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &file.encrypted_key)
            .map_err(|e| IdentityError::InvalidFileFormat(format!("bad key base64: {e}")))?;

    let mut master = derive_passphrase_key(passphrase.as_bytes(), &salt)?;
    let mut enc_key = derive_key(&master, &snapshot_context())?;
    master.zeroize();
    let opened = open(&enc_key, &nonce, &ciphertext);
    enc_key.zeroize();
    let mut key_vec = opened?;

    let signing_key: [u8; 32] = key_vec.as_slice().try_into().map_err(|_| {
        IdentityError::InvalidFileFormat("decrypted key must be 32 bytes".into())
    })?;
    key_vec.zeroize();

    let account = file.account;
    let identity = Identity::restore(
        &signing_key,
        account.id,
        account.state,
        account.auth_claim,
        account.claims,
        account.received,
        account.revoked_nonces,
    )?;
    info!("loaded identity {} from {}", identity.id(), path.display());
    Ok(identity)
}

/// Read the plaintext account record without a passphrase.
pub fn read_account(path: &Path) -> Result<Account> {
    Ok(parse_vid_file(path)?.account)
}

fn parse_vid_file(path: &Path) -> Result<VidFile> {
    let json = fs::read_to_string(path)?;
    let file: VidFile = serde_json::from_str(&json)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("snapshot decode: {e}")))?;
    if file.format != VID_FORMAT || file.version != VID_VERSION {
        return Err(IdentityError::InvalidFileFormat(format!(
            "unsupported snapshot format {} v{}",
            file.format, file.version
        )));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{SchemaHash, SlotValue};
    use tempfile::tempdir;

    fn populated_identity() -> Identity {
        let mut identity = Identity::new().unwrap();
        let claim = Claim::builder(SchemaHash::from_document(b"{}", "AgeCredential"))
            .index_data(SlotValue::from_u64(19960424), SlotValue::ZERO)
            .revocation_nonce(7)
            .build()
            .unwrap();
        identity.add_claim(&claim).unwrap();
        identity.revoke(7).unwrap();
        identity
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        let identity = populated_identity();

        save_snapshot(&identity, &path, "hunter2").unwrap();
        let loaded = load_snapshot(&path, "hunter2").unwrap();

        assert_eq!(loaded.id(), identity.id());
        assert_eq!(loaded.state(), identity.state());
        assert_eq!(loaded.claims().len(), 1);
        assert_eq!(loaded.revoked_nonces(), &[7]);
    }

    #[test]
    fn test_wrong_passphrase_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        save_snapshot(&populated_identity(), &path, "correct").unwrap();

        assert!(matches!(
            load_snapshot(&path, "wrong"),
            Err(IdentityError::InvalidPassphrase)
        ));
    }

    #[test]
    fn test_read_account_needs_no_passphrase() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        let identity = populated_identity();
        save_snapshot(&identity, &path, "secret").unwrap();

        let account = read_account(&path).unwrap();
        assert_eq!(account.id, identity.id());
        assert_eq!(account.state, identity.state());
        assert_eq!(account.claims.len(), 1);
    }

    #[test]
    fn test_tampered_state_detected_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        save_snapshot(&populated_identity(), &path, "pw").unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let mut file: VidFile = serde_json::from_str(&json).unwrap();
        file.account.state = Digest::from_u64(42);
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        assert!(matches!(
            load_snapshot(&path, "pw"),
            Err(IdentityError::StateMismatch { .. })
        ));
    }

    #[test]
    fn test_dropped_claim_detected_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        save_snapshot(&populated_identity(), &path, "pw").unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let mut file: VidFile = serde_json::from_str(&json).unwrap();
        file.account.claims.clear();
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        assert!(matches!(
            load_snapshot(&path, "pw"),
            Err(IdentityError::StateMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        save_snapshot(&populated_identity(), &path, "pw").unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let mut file: VidFile = serde_json::from_str(&json).unwrap();
        file.format = "vid-v9".to_string();
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        assert!(matches!(
            read_account(&path),
            Err(IdentityError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn test_short_nonce_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        save_snapshot(&populated_identity(), &path, "pw").unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let mut file: VidFile = serde_json::from_str(&json).unwrap();
        file.encryption.nonce = "deadbeef".to_string();
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        assert!(matches!(
            load_snapshot(&path, "pw"),
            Err(IdentityError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn test_snapshot_does_not_leak_signing_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("me.vid");
        let identity = populated_identity();
        save_snapshot(&identity, &path, "pw").unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let key_hex = hex::encode(identity.key_pair.signing_key_bytes());
        assert!(!json.contains(&key_hex));
    }
}
