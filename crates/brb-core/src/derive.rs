//! Deterministic derived addresses
//!
//! A derived address is a pure function of `(namespace, parent, program)`.
//! The search walks a one-byte nonce down from 255 and keeps the first hash
//! that is *not* a valid Ed25519 point, so no private key can ever exist for
//! it. Acting for a derived address is up to the ledger, which only honors
//! capabilities issued by the registered program.

use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::types::{Address, ProgramId};

/// Longest namespace accepted by the deriver
pub const MAX_NAMESPACE_LEN: usize = 32;

/// Namespace of the treasury record (parent: the program id)
pub const TREASURY_NAMESPACE: &[u8] = b"treasury";

/// Namespace of the reserve custody vault (parent: the treasury)
pub const RESERVE_VAULT_NAMESPACE: &[u8] = b"reserve_vault";

/// Namespace of the issued-asset mint authority (parent: the treasury)
pub const MINT_AUTHORITY_NAMESPACE: &[u8] = b"mint_authority";

const DERIVATION_MARKER: &[u8] = b"BrbDerivedAddress";

/// Hash the derivation inputs with an explicit nonce.
///
/// Fails with [`CoreError::OnCurveDerivation`] when the hash happens to be a
/// valid curve point; callers searching for a nonce move on to the next one.
pub fn create_derived_address(
    namespace: &[u8],
    parent: &Address,
    nonce: u8,
    program: &ProgramId,
) -> Result<Address> {
    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(CoreError::NamespaceTooLong {
            len: namespace.len(),
            max: MAX_NAMESPACE_LEN,
        });
    }

    let mut hasher = Sha256::new();
    hasher.update(namespace);
    hasher.update(parent.as_bytes());
    hasher.update([nonce]);
    hasher.update(program.as_bytes());
    hasher.update(DERIVATION_MARKER);
    let address = Address(hasher.finalize().into());

    if address.is_on_curve() {
        return Err(CoreError::OnCurveDerivation);
    }
    Ok(address)
}

/// Find the canonical derived address for `(namespace, parent)` and the
/// nonce that produced it.
pub fn derive_address(namespace: &[u8], parent: &Address, program: &ProgramId) -> Result<(Address, u8)> {
    for nonce in (0..=u8::MAX).rev() {
        match create_derived_address(namespace, parent, nonce, program) {
            Ok(address) => return Ok((address, nonce)),
            Err(CoreError::OnCurveDerivation) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(CoreError::NoViableNonce {
        namespace: String::from_utf8_lossy(namespace).into_owned(),
    })
}
