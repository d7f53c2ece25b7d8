//! Cryptographic utilities for BRB
//!
//! Caller identities are Ed25519 public keys. Hashing is SHA-256.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::types::Address;

/// A keypair for a caller identity
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create from a seed (32 bytes)
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Demo identity derived from a human name.
    ///
    /// Anyone who knows the name can reproduce the key; only use this for
    /// local tooling.
    pub fn from_label(label: &str) -> Self {
        Self::from_seed(&sha256(format!("brb-identity:{}", label).as_bytes()))
    }

    /// The identity's address (its public key)
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }
}

/// Compute SHA-256 of data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
