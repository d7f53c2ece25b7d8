//! Treasury error taxonomy
//!
//! Every variant is returned before any effect is applied, so a failed call
//! leaves the record and all ledger balances as they were.

use brb_core::{Address, AssetId, CoreError};
use brb_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during treasury operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Treasury already initialized at {address}")]
    AlreadyInitialized { address: Address },

    #[error("No treasury at {address}")]
    NotInitialized { address: Address },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Treasury is currently paused")]
    TreasuryPaused,

    #[error("Unauthorized: {caller} is not the treasury admin")]
    Unauthorized { caller: Address },

    #[error("Insufficient funds in {account} for {asset}: have {available}, need {required}")]
    InsufficientFunds {
        account: Address,
        asset: AssetId,
        available: u64,
        required: u64,
    },

    #[error("Arithmetic overflow in {field}")]
    ArithmeticOverflow { field: String },

    #[error("Reserve asset {asset} has no mint in the ledger")]
    UnknownReserveAsset { asset: AssetId },

    #[error("Peg broken: collateral {collateral} != issued supply {supply}")]
    PegBroken { collateral: u64, supply: u64 },

    #[error("Derivation error: {0}")]
    Derivation(#[from] CoreError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl TreasuryError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TreasuryError::AlreadyInitialized { .. } => "already_initialized",
            TreasuryError::NotInitialized { .. } => "not_initialized",
            TreasuryError::InvalidAmount { .. } => "invalid_amount",
            TreasuryError::TreasuryPaused => "treasury_paused",
            TreasuryError::Unauthorized { .. } => "unauthorized",
            TreasuryError::InsufficientFunds { .. } => "insufficient_funds",
            TreasuryError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            TreasuryError::UnknownReserveAsset { .. } => "unknown_reserve_asset",
            TreasuryError::PegBroken { .. } => "peg_broken",
            TreasuryError::Derivation(_) => "derivation_error",
            TreasuryError::Ledger(_) => "ledger_error",
        }
    }
}

impl From<LedgerError> for TreasuryError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance {
                account,
                asset,
                available,
                required,
            } => TreasuryError::InsufficientFunds {
                account,
                asset,
                available,
                required,
            },
            other => TreasuryError::Ledger(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TreasuryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_maps_to_insufficient_funds() {
        let account = Address([3u8; 32]);
        let err: TreasuryError = LedgerError::InsufficientBalance {
            account,
            asset: AssetId::usdc(),
            available: 5,
            required: 10,
        }
        .into();

        assert_eq!(
            err,
            TreasuryError::InsufficientFunds {
                account,
                asset: AssetId::usdc(),
                available: 5,
                required: 10,
            }
        );
        assert_eq!(err.code(), "insufficient_funds");
    }

    #[test]
    fn test_other_ledger_errors_are_wrapped() {
        let err: TreasuryError = LedgerError::EmptyBatch {
            correlation_id: "x".to_string(),
        }
        .into();
        assert!(matches!(err, TreasuryError::Ledger(LedgerError::EmptyBatch { .. })));
    }
}
