//! BRB Core - Canonical types for the BRB collateralized token
//!
//! This crate holds the primitives shared by the ledger and the treasury:
//! - Address / ProgramId: 32-byte identifiers, hex in text form
//! - AssetId / Amount: asset references and smallest-unit amounts (6 decimals)
//! - Keypair: Ed25519 identities for callers
//! - derive: deterministic derived addresses and their nonces
//!
//! # Invariants
//!
//! 1. Identities are always valid curve points
//! 2. Derived addresses are never valid curve points, so nobody holds a key for them
//! 3. Amounts never go negative

pub mod crypto;
pub mod derive;
pub mod error;
pub mod types;

pub use crypto::*;
pub use derive::*;
pub use error::*;
pub use types::*;
