//! Snapshot persistence.
//!
//! Identities are saved as `.vid` files: a JSON envelope holding the
//! plaintext account record (identifier, roots, claims) and the
//! signing key sealed under a passphrase-derived key. Loading replays
//! every recorded mutation and cross-checks the result against the
//! stored identifier and state, so a corrupted or tampered snapshot is
//! rejected instead of silently producing a different identity.

pub mod snapshot;

pub use snapshot::{load_snapshot, read_account, save_snapshot, Account, VidFile};
