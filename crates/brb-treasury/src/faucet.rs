//! Reserve-asset faucet for local deployments
//!
//! Stands in for the external issuer of the reserve asset: it owns the
//! reserve mint in the ledger and can credit any identity.

use brb_core::{Address, Amount, AssetId, Keypair, DECIMALS};
use brb_ledger::{LedgerBatch, LedgerService, Signer};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, TreasuryError};

/// Mint authority for a local reserve asset
pub struct ReserveFaucet {
    asset: AssetId,
    authority: Keypair,
}

impl ReserveFaucet {
    /// The authority is derived from the asset id, so every process sharing a
    /// ledger agrees on it.
    pub fn new(asset: AssetId) -> Self {
        let authority = Keypair::from_label(&format!("reserve-faucet:{}", asset));
        Self { asset, authority }
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn authority(&self) -> Address {
        self.authority.address()
    }

    /// Create the reserve mint if the ledger does not have it yet.
    ///
    /// Returns `true` if the mint was created.
    pub fn install<L: LedgerService + ?Sized>(&self, ledger: &L) -> Result<bool> {
        if ledger.supply(&self.asset).is_some() {
            return Ok(false);
        }
        ledger.apply(
            LedgerBatch::new(format!("faucet_install_{}", Uuid::new_v4())).create_mint(
                self.asset.clone(),
                self.authority(),
                DECIMALS,
            ),
        )?;
        info!(asset = %self.asset, authority = %self.authority().short(), "Reserve mint installed");
        Ok(true)
    }

    /// Credit `amount` of the reserve asset to `to`.
    pub fn drip<L: LedgerService + ?Sized>(&self, ledger: &L, to: &Address, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Err(TreasuryError::InvalidAmount {
                message: "Faucet amount must be greater than zero".to_string(),
            });
        }
        ledger.apply(
            LedgerBatch::new(format!("faucet_{}", Uuid::new_v4())).mint_to(
                self.asset.clone(),
                *to,
                amount,
                Signer::Identity(self.authority()),
            ),
        )?;
        info!(asset = %self.asset, to = %to.short(), amount = %amount, "Faucet drip");
        Ok(ledger.balance(to, &self.asset))
    }
}
