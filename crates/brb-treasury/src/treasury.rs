//! The treasury engine: initialize, deposit-and-mint, burn-and-redeem, pause

use std::collections::HashMap;
use std::sync::Arc;

use brb_core::{
    derive_address, Address, Amount, AssetId, MINT_AUTHORITY_NAMESPACE, RESERVE_VAULT_NAMESPACE,
    TREASURY_NAMESPACE,
};
use brb_ledger::{LedgerBatch, LedgerError, LedgerService, ProgramHandle, Signer, SigningCapability};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::TreasuryConfig;
use crate::error::{Result, TreasuryError};
use crate::guard::ensure_admin;
use crate::record::{TreasuryRecord, TreasuryView};

/// A holder's balances in both assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderBalances {
    pub reserve: Amount,
    pub issued: Amount,
}

/// The BRB treasury
///
/// Holds treasury records by address and drives the ledger. Every mutating
/// operation takes the records write lock for its whole check-apply-commit
/// cycle, so mutations are serialized and readers only ever see committed
/// records.
///
/// The engine registers its program with the ledger on construction and keeps
/// the only handle, so nothing else can sign for the treasury or the mint
/// authority.
pub struct Treasury<L: LedgerService> {
    config: TreasuryConfig,
    ledger: Arc<L>,
    handle: ProgramHandle,
    records: RwLock<HashMap<Address, TreasuryRecord>>,
}

impl<L: LedgerService> Treasury<L> {
    /// Create a treasury engine with no records
    pub fn new(config: TreasuryConfig, ledger: Arc<L>) -> Result<Self> {
        Self::with_records(config, ledger, Vec::new())
    }

    /// Restore an engine from persisted records
    ///
    /// Fails if another engine already registered the program on this ledger.
    pub fn with_records(config: TreasuryConfig, ledger: Arc<L>, records: Vec<TreasuryRecord>) -> Result<Self> {
        let handle = ledger.register_program(config.program_id)?;
        Ok(Self {
            config,
            ledger,
            handle,
            records: RwLock::new(records.into_iter().map(|r| (r.address, r)).collect()),
        })
    }

    /// Swap every record for `records`, e.g. to roll back to a saved state.
    pub fn replace_records(&self, records: Vec<TreasuryRecord>) {
        *self.records.write() = records.into_iter().map(|r| (r.address, r)).collect();
    }

    pub fn config(&self) -> &TreasuryConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// The derived address of this deployment's treasury record
    pub fn treasury_address(&self) -> Result<Address> {
        let program = &self.config.program_id;
        let (address, _) = derive_address(TREASURY_NAMESPACE, program.as_address(), program)?;
        Ok(address)
    }

    /// Get a copy of a record
    pub fn record(&self, treasury: &Address) -> Result<TreasuryRecord> {
        self.records
            .read()
            .get(treasury)
            .cloned()
            .ok_or(TreasuryError::NotInitialized { address: *treasury })
    }

    /// The read-only query
    pub fn view(&self, treasury: &Address) -> Result<TreasuryView> {
        self.record(treasury).map(|r| r.view())
    }

    /// All records, ordered by address
    pub fn records(&self) -> Vec<TreasuryRecord> {
        let mut records: Vec<TreasuryRecord> = self.records.read().values().cloned().collect();
        records.sort_by_key(|r| r.address);
        records
    }

    /// A holder's reserve and issued balances
    pub fn balances(&self, treasury: &Address, holder: &Address) -> Result<HolderBalances> {
        let record = self.record(treasury)?;
        Ok(HolderBalances {
            reserve: self.ledger.balance(holder, &record.reserve_asset),
            issued: self.ledger.balance(holder, &record.issued_asset),
        })
    }

    /// Create the treasury record, its custody vault and the issued-asset mint.
    pub fn initialize(&self, admin: &Address, reserve_asset: &AssetId) -> Result<TreasuryRecord> {
        let program = self.config.program_id;
        let (address, treasury_cap) = self.handle.derive(TREASURY_NAMESPACE, program.as_address())?;
        let (reserve_vault, vault_cap) = self.handle.derive(RESERVE_VAULT_NAMESPACE, &address)?;
        let (mint_authority, mint_cap) = self.handle.derive(MINT_AUTHORITY_NAMESPACE, &address)?;
        let issued_asset = AssetId::from_mint(&mint_authority);

        let mut records = self.records.write();
        // The ledger may hold the deployment even when the record was lost.
        if records.contains_key(&address)
            || self.ledger.supply(&issued_asset).is_some()
            || self.ledger.account_exists(&reserve_vault)
        {
            return Err(TreasuryError::AlreadyInitialized { address });
        }
        if self.ledger.supply(reserve_asset).is_none() {
            return Err(TreasuryError::UnknownReserveAsset {
                asset: reserve_asset.clone(),
            });
        }

        let batch = LedgerBatch::new(format!("init_{}", Uuid::new_v4()))
            .create_mint(issued_asset.clone(), mint_authority, self.config.decimals)
            .open_account(reserve_vault, address);
        self.ledger.apply(batch)?;

        let record = TreasuryRecord {
            address,
            program,
            admin: *admin,
            issued_asset,
            issued_symbol: self.config.issued_symbol.clone(),
            decimals: self.config.decimals,
            reserve_asset: reserve_asset.clone(),
            reserve_vault,
            mint_authority,
            total_collateral: Amount::zero(),
            total_issued_supply: Amount::zero(),
            is_paused: false,
            derivation_nonce: treasury_cap.nonce(),
            vault_nonce: vault_cap.nonce(),
            mint_authority_nonce: mint_cap.nonce(),
            initialized_at: Utc::now(),
        };
        records.insert(address, record.clone());

        info!(
            treasury = %address,
            admin = %admin,
            vault = %reserve_vault,
            "Treasury initialized"
        );
        Ok(record)
    }

    /// Deposit `amount` of reserve and mint the same amount of the issued asset.
    pub fn mint(&self, treasury: &Address, caller: &Address, amount: Amount) -> Result<TreasuryRecord> {
        require_positive(amount)?;

        let mut records = self.records.write();
        let record = records
            .get_mut(treasury)
            .ok_or(TreasuryError::NotInitialized { address: *treasury })?;
        record.check_peg()?;

        if record.is_paused {
            return Err(TreasuryError::TreasuryPaused);
        }

        let mut next = record.clone();
        next.total_collateral = record
            .total_collateral
            .checked_add(amount)
            .ok_or_else(|| overflow("total_collateral"))?;
        next.total_issued_supply = record
            .total_issued_supply
            .checked_add(amount)
            .ok_or_else(|| overflow("total_issued_supply"))?;
        next.check_peg()?;

        let batch = LedgerBatch::new(format!("mint_{}", Uuid::new_v4()))
            .transfer(
                *caller,
                record.reserve_vault,
                record.reserve_asset.clone(),
                amount,
                Signer::Identity(*caller),
            )
            .mint_to(
                record.issued_asset.clone(),
                *caller,
                amount,
                Signer::Delegated(self.mint_authority_capability(record)?),
            );
        self.ledger
            .apply(batch)
            .map_err(|e| missing_account_as_funds(e, &record.reserve_asset, amount))?;
        *record = next;

        info!(
            treasury = %record.address.short(),
            caller = %caller.short(),
            amount = %amount,
            total_collateral = %record.total_collateral,
            "Minted {} for {}",
            record.issued_symbol,
            record.reserve_asset
        );
        Ok(record.clone())
    }

    /// Burn `amount` of the issued asset and redeem the same amount of reserve.
    ///
    /// Redemption stays open while the treasury is paused; pausing only halts
    /// new issuance.
    pub fn burn(&self, treasury: &Address, caller: &Address, amount: Amount) -> Result<TreasuryRecord> {
        require_positive(amount)?;

        let mut records = self.records.write();
        let record = records
            .get_mut(treasury)
            .ok_or(TreasuryError::NotInitialized { address: *treasury })?;
        record.check_peg()?;

        if amount > record.total_collateral {
            return Err(TreasuryError::InsufficientFunds {
                account: record.reserve_vault,
                asset: record.reserve_asset.clone(),
                available: record.total_collateral.0,
                required: amount.0,
            });
        }

        let mut next = record.clone();
        next.total_collateral = record
            .total_collateral
            .checked_sub(amount)
            .ok_or_else(|| overflow("total_collateral"))?;
        next.total_issued_supply = record
            .total_issued_supply
            .checked_sub(amount)
            .ok_or_else(|| overflow("total_issued_supply"))?;
        next.check_peg()?;

        let batch = LedgerBatch::new(format!("burn_{}", Uuid::new_v4()))
            .burn(
                record.issued_asset.clone(),
                *caller,
                amount,
                Signer::Identity(*caller),
                Signer::Delegated(self.mint_authority_capability(record)?),
            )
            .transfer(
                record.reserve_vault,
                *caller,
                record.reserve_asset.clone(),
                amount,
                Signer::Delegated(self.treasury_capability(record)?),
            );
        self.ledger
            .apply(batch)
            .map_err(|e| missing_account_as_funds(e, &record.issued_asset, amount))?;
        *record = next;

        info!(
            treasury = %record.address.short(),
            caller = %caller.short(),
            amount = %amount,
            total_collateral = %record.total_collateral,
            "Redeemed {} for {}",
            record.reserve_asset,
            record.issued_symbol
        );
        Ok(record.clone())
    }

    /// Admin-only: set the circuit breaker.
    pub fn set_paused(&self, treasury: &Address, caller: &Address, paused: bool) -> Result<TreasuryRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(treasury)
            .ok_or(TreasuryError::NotInitialized { address: *treasury })?;
        ensure_admin(record, caller)?;

        record.is_paused = paused;
        if paused {
            info!(treasury = %record.address.short(), "Treasury paused by admin");
        } else {
            info!(treasury = %record.address.short(), "Treasury unpaused by admin");
        }
        Ok(record.clone())
    }

    /// Capability to act as the treasury (owner of the reserve vault)
    fn treasury_capability(&self, record: &TreasuryRecord) -> Result<SigningCapability> {
        Ok(self
            .handle
            .capability(TREASURY_NAMESPACE, record.program.as_address(), record.derivation_nonce)?)
    }

    /// Capability to act as the issued asset's mint authority
    fn mint_authority_capability(&self, record: &TreasuryRecord) -> Result<SigningCapability> {
        Ok(self
            .handle
            .capability(MINT_AUTHORITY_NAMESPACE, &record.address, record.mint_authority_nonce)?)
    }
}

fn require_positive(amount: Amount) -> Result<()> {
    if amount.is_zero() {
        return Err(TreasuryError::InvalidAmount {
            message: "Amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn overflow(field: &str) -> TreasuryError {
    TreasuryError::ArithmeticOverflow {
        field: field.to_string(),
    }
}

/// A debit from an account the ledger has never seen is a zero balance.
fn missing_account_as_funds(e: LedgerError, asset: &AssetId, amount: Amount) -> TreasuryError {
    match e {
        LedgerError::AccountNotFound { account } => TreasuryError::InsufficientFunds {
            account,
            asset: asset.clone(),
            available: 0,
            required: amount.0,
        },
        other => other.into(),
    }
}
