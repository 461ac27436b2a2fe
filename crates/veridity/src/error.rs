//! Error types for Veridity.
//!
//! Variants are grouped by recoverability: validation and not-found
//! errors are request-scoped and side-effect-free; tree and consistency
//! errors leave the in-memory identity unfit for further mutation or
//! persistence until it is reloaded. Private key material is never
//! included in error messages.

/// Identity error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    // ── Validation: malformed input, returned directly to the caller ──
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Malformed claim: {0}")]
    MalformedClaim(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    // ── Not found: unknown claim or subject, side-effect-free ─────────
    #[error("Claim not found for schema {0}")]
    ClaimNotFound(String),

    #[error("Claim with revocation nonce {0} is revoked")]
    ClaimRevoked(u64),

    // ── Tree: the accumulator cannot un-insert; callers must discard
    //    the in-memory identity and reload from the last snapshot ─────
    #[error("Duplicate leaf at index {index}")]
    DuplicateLeaf { index: String },

    #[error("Unknown tree root {root}")]
    UnknownRoot { root: String },

    #[error("Tree node missing for hash {hash}")]
    NodeMissing { hash: String },

    #[error("Tree depth limit reached while inserting index {index}")]
    MaxDepthReached { index: String },

    // ── Consistency: snapshot replay produced a different identity ────
    #[error("Identifier mismatch on load: stored {stored}, recomputed {recomputed}")]
    IdMismatch { stored: String, recomputed: String },

    #[error("Identity state mismatch on load: stored {stored}, recomputed {recomputed}")]
    StateMismatch { stored: String, recomputed: String },

    // ── External: prover, storage, crypto plumbing ────────────────────
    #[error("Prover failed: {0}")]
    ProverFailed(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IdentityError {
    /// Whether the error leaves the in-memory identity inconsistent
    /// with its last durable snapshot. When `true` the identity must
    /// not be mutated further or persisted; discard and reload it.
    pub fn poisons_identity(&self) -> bool {
        matches!(
            self,
            Self::DuplicateLeaf { .. }
                | Self::UnknownRoot { .. }
                | Self::NodeMissing { .. }
                | Self::MaxDepthReached { .. }
                | Self::IdMismatch { .. }
                | Self::StateMismatch { .. }
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
