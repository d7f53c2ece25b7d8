//! The treasury record and its read-only view

use brb_core::{
    create_derived_address, Address, Amount, AssetId, ProgramId, MINT_AUTHORITY_NAMESPACE, RESERVE_VAULT_NAMESPACE,
    TREASURY_NAMESPACE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreasuryError};

/// Circuit-breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasuryStatus {
    Active,
    Paused,
}

/// The treasury record
///
/// Created once by `initialize` and never deleted. `admin`, the asset
/// references and the derived addresses never change after creation; only the
/// two counters and the pause flag move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryRecord {
    /// Derived address of this record
    pub address: Address,
    pub program: ProgramId,
    pub admin: Address,
    /// The issued asset (its mint is controlled by `mint_authority`)
    pub issued_asset: AssetId,
    pub issued_symbol: String,
    pub decimals: u8,
    pub reserve_asset: AssetId,
    /// Custody account holding the reserve collateral
    pub reserve_vault: Address,
    pub mint_authority: Address,
    pub total_collateral: Amount,
    pub total_issued_supply: Amount,
    pub is_paused: bool,
    /// Nonce that derived `address`
    pub derivation_nonce: u8,
    pub vault_nonce: u8,
    pub mint_authority_nonce: u8,
    pub initialized_at: DateTime<Utc>,
}

impl TreasuryRecord {
    pub fn status(&self) -> TreasuryStatus {
        if self.is_paused {
            TreasuryStatus::Paused
        } else {
            TreasuryStatus::Active
        }
    }

    /// Collateral and issued supply must be equal.
    pub fn check_peg(&self) -> Result<()> {
        if self.total_collateral != self.total_issued_supply {
            return Err(TreasuryError::PegBroken {
                collateral: self.total_collateral.0,
                supply: self.total_issued_supply.0,
            });
        }
        Ok(())
    }

    /// Re-derive all three addresses from the stored nonces.
    pub fn verify_derivation(&self) -> bool {
        let rederive = |namespace: &[u8], parent: &Address, nonce: u8, expected: &Address| {
            create_derived_address(namespace, parent, nonce, &self.program)
                .map(|address| &address == expected)
                .unwrap_or(false)
        };

        rederive(
            TREASURY_NAMESPACE,
            self.program.as_address(),
            self.derivation_nonce,
            &self.address,
        ) && rederive(
            RESERVE_VAULT_NAMESPACE,
            &self.address,
            self.vault_nonce,
            &self.reserve_vault,
        ) && rederive(
            MINT_AUTHORITY_NAMESPACE,
            &self.address,
            self.mint_authority_nonce,
            &self.mint_authority,
        )
    }

    pub fn view(&self) -> TreasuryView {
        TreasuryView {
            address: self.address,
            admin: self.admin,
            issued_asset: self.issued_asset.clone(),
            issued_symbol: self.issued_symbol.clone(),
            reserve_asset: self.reserve_asset.clone(),
            reserve_vault: self.reserve_vault,
            total_collateral: self.total_collateral,
            total_issued_supply: self.total_issued_supply,
            is_paused: self.is_paused,
            status: self.status(),
            collateral_ratio: collateral_ratio(self.total_collateral, self.total_issued_supply),
        }
    }
}

/// Read-only projection of the record for display and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryView {
    pub address: Address,
    pub admin: Address,
    pub issued_asset: AssetId,
    pub issued_symbol: String,
    pub reserve_asset: AssetId,
    pub reserve_vault: Address,
    pub total_collateral: Amount,
    pub total_issued_supply: Amount,
    pub is_paused: bool,
    pub status: TreasuryStatus,
    /// Collateral per issued unit; `None` while nothing is issued
    pub collateral_ratio: Option<f64>,
}

fn collateral_ratio(collateral: Amount, supply: Amount) -> Option<f64> {
    if supply.is_zero() {
        return None;
    }
    Some(collateral.0 as f64 / supply.0 as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brb_core::derive_address;

    fn record() -> TreasuryRecord {
        let program = ProgramId::from_label("record-test");
        let (address, derivation_nonce) = derive_address(TREASURY_NAMESPACE, program.as_address(), &program).unwrap();
        let (reserve_vault, vault_nonce) = derive_address(RESERVE_VAULT_NAMESPACE, &address, &program).unwrap();
        let (mint_authority, mint_authority_nonce) =
            derive_address(MINT_AUTHORITY_NAMESPACE, &address, &program).unwrap();

        TreasuryRecord {
            address,
            program,
            admin: Address([1u8; 32]),
            issued_asset: AssetId::from_mint(&mint_authority),
            issued_symbol: "BRB".to_string(),
            decimals: 6,
            reserve_asset: AssetId::usdc(),
            reserve_vault,
            mint_authority,
            total_collateral: Amount::zero(),
            total_issued_supply: Amount::zero(),
            is_paused: false,
            derivation_nonce,
            vault_nonce,
            mint_authority_nonce,
            initialized_at: Utc::now(),
        }
    }

    #[test]
    fn test_stored_nonces_verify() {
        assert!(record().verify_derivation());
    }

    #[test]
    fn test_tampered_nonce_fails_verification() {
        let mut record = record();
        record.vault_nonce = record.vault_nonce.wrapping_sub(1);
        assert!(!record.verify_derivation());
    }

    #[test]
    fn test_peg_check() {
        let mut record = record();
        assert!(record.check_peg().is_ok());

        record.total_collateral = Amount::new(10);
        assert_eq!(
            record.check_peg(),
            Err(TreasuryError::PegBroken {
                collateral: 10,
                supply: 0
            })
        );
    }

    #[test]
    fn test_view_and_ratio() {
        let mut record = record();
        let view = record.view();
        assert_eq!(view.status, TreasuryStatus::Active);
        assert_eq!(view.collateral_ratio, None);

        record.total_collateral = Amount::new(100);
        record.total_issued_supply = Amount::new(100);
        record.is_paused = true;
        let view = record.view();
        assert_eq!(view.status, TreasuryStatus::Paused);
        assert_eq!(view.collateral_ratio, Some(1.0));
    }
}
