//! Cryptographic primitives for Veridity.
//!
//! This module provides:
//! - SHA-256 digests and multi-element hashing for tree and state computation
//! - Ed25519 key generation, signing, and verification
//! - HKDF-SHA256 key derivation
//! - Argon2id passphrase-based key derivation
//! - ChaCha20-Poly1305 authenticated encryption for snapshots at rest

pub mod derivation;
pub mod encryption;
pub mod hash;
pub mod keys;
pub mod signing;

pub use hash::{hash_elems, Digest};
pub use keys::Ed25519KeyPair;
