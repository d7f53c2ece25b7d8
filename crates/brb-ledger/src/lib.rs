//! BRB Ledger - Token ledger behind the treasury
//!
//! The ledger is:
//! - Account-keyed by Address, each account with a single owner
//! - Multi-asset (reserve USDC and the issued BRB live side by side)
//! - Mint-aware (every mint has one authority and a tracked supply)
//! - Batch-atomic (a batch either commits every operation or none)
//! - Append-only (entries are never rewritten)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. A debit needs a signer equal to the account owner
//! 3. Mint and burn need a signer equal to the mint authority
//! 4. A derived (off-curve) address can only sign through a capability issued
//!    by the handle of its registered program
//! 5. A failed batch leaves balances, supplies and the journal untouched

use std::collections::{BTreeMap, HashMap};

use brb_core::{create_derived_address, derive_address, Address, Amount, AssetId, ProgramId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {account}")]
    AccountNotFound { account: Address },

    #[error("Account already exists: {account}")]
    AccountExists { account: Address },

    #[error("Mint not found: {asset}")]
    MintNotFound { asset: AssetId },

    #[error("Mint already exists: {asset}")]
    MintExists { asset: AssetId },

    #[error("Insufficient balance in {account} for {asset}: have {available}, need {required}")]
    InsufficientBalance {
        account: Address,
        asset: AssetId,
        available: u64,
        required: u64,
    },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Signer {signer} is not authorized, expected {expected}")]
    Unauthorized { signer: Address, expected: Address },

    #[error("Invalid signer {signer}: {message}")]
    InvalidSigner { signer: Address, message: String },

    #[error("Overflow: {message}")]
    Overflow { message: String },

    #[error("Batch {correlation_id} is empty")]
    EmptyBatch { correlation_id: String },

    #[error("Program already registered: {program}")]
    ProgramRegistered { program: ProgramId },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

// ============================================================================
// Programs and signers
// ============================================================================

/// Proof that its holder registered a program with a ledger.
///
/// Issued once per program by [`LedgerService::register_program`]. It cannot
/// be cloned or assembled from public inputs, so only the holder can hand out
/// capabilities for the program's derived addresses.
#[derive(Debug)]
pub struct ProgramHandle {
    program: ProgramId,
    token: Uuid,
}

impl ProgramHandle {
    pub fn program(&self) -> &ProgramId {
        &self.program
    }

    /// Find the canonical derived address for `(namespace, parent)` together
    /// with the capability to sign for it.
    pub fn derive(&self, namespace: &[u8], parent: &Address) -> brb_core::Result<(Address, SigningCapability)> {
        let (address, nonce) = derive_address(namespace, parent, &self.program)?;
        Ok((address, self.capability(namespace, parent, nonce)?))
    }

    /// Capability to sign for the address derived from `(namespace, parent, nonce)`.
    pub fn capability(&self, namespace: &[u8], parent: &Address, nonce: u8) -> brb_core::Result<SigningCapability> {
        let address = create_derived_address(namespace, parent, nonce, &self.program)?;
        Ok(SigningCapability {
            address,
            namespace: namespace.to_vec(),
            parent: *parent,
            nonce,
            program: self.program,
            token: self.token,
        })
    }
}

/// Authority to act for one derived address
#[derive(Debug, PartialEq, Eq)]
pub struct SigningCapability {
    address: Address,
    namespace: Vec<u8>,
    parent: Address,
    nonce: u8,
    program: ProgramId,
    token: Uuid,
}

impl SigningCapability {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn nonce(&self) -> u8 {
        self.nonce
    }

    fn namespace_str(&self) -> String {
        String::from_utf8_lossy(&self.namespace).into_owned()
    }

    /// Re-derive the address and match the token against the registration.
    fn verify(&self, programs: &HashMap<ProgramId, Uuid>) -> bool {
        let derives = create_derived_address(&self.namespace, &self.parent, self.nonce, &self.program)
            .map(|address| address == self.address)
            .unwrap_or(false);
        derives && programs.get(&self.program) == Some(&self.token)
    }
}

/// Who authorizes an operation
#[derive(Debug, PartialEq, Eq)]
pub enum Signer {
    /// An authenticated caller identity (already verified upstream)
    Identity(Address),
    /// A derived address acting through its capability
    Delegated(SigningCapability),
}

impl Signer {
    /// Check the signer is well-formed and return its address.
    ///
    /// Identities must be real keys, so an off-curve address presented as an
    /// identity is rejected. Capabilities must re-derive to their address and
    /// come from the handle registered for their program.
    fn authenticate(&self, programs: &HashMap<ProgramId, Uuid>) -> Result<Address> {
        match self {
            Signer::Identity(address) if !address.is_on_curve() => Err(LedgerError::InvalidSigner {
                signer: *address,
                message: "derived addresses cannot sign directly".to_string(),
            }),
            Signer::Identity(address) => Ok(*address),
            Signer::Delegated(capability) if !capability.verify(programs) => Err(LedgerError::InvalidSigner {
                signer: capability.address,
                message: format!(
                    "capability for namespace {} was not issued by program {}",
                    capability.namespace_str(),
                    capability.program
                ),
            }),
            Signer::Delegated(capability) => Ok(capability.address),
        }
    }

    fn authorize(&self, expected: &Address, programs: &HashMap<ProgramId, Uuid>) -> Result<()> {
        let signer = self.authenticate(programs)?;
        if &signer != expected {
            return Err(LedgerError::Unauthorized {
                signer,
                expected: *expected,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Unique identifier for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Credit (increase) to an account
    Credit,
    /// Debit (decrease) from an account
    Debit,
}

/// Reason for a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    Transfer,
    Mint,
    Burn,
}

/// A single ledger entry (one side of a movement)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub account: Address,
    pub asset: AssetId,
    pub entry_type: EntryType,
    pub amount: Amount,
    pub balance_after: Amount,
    pub reason: EntryReason,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Accounts and mints
// ============================================================================

/// Account state in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub owner: Address,
    pub balances: BTreeMap<AssetId, Amount>,
    pub entry_count: u64,
}

impl AccountState {
    fn new(owner: Address) -> Self {
        Self {
            owner,
            balances: BTreeMap::new(),
            entry_count: 0,
        }
    }

    pub fn balance(&self, asset: &AssetId) -> Amount {
        self.balances.get(asset).copied().unwrap_or(Amount::zero())
    }
}

/// A mint: the sole source of new units of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    pub asset: AssetId,
    pub authority: Address,
    pub decimals: u8,
    pub supply: Amount,
}

// ============================================================================
// Batches
// ============================================================================

/// One step of a batch
#[derive(Debug)]
pub enum LedgerOp {
    /// Register a new mint with zero supply
    CreateMint {
        asset: AssetId,
        authority: Address,
        decimals: u8,
    },
    /// Open an account whose owner is someone other than itself
    OpenAccount { address: Address, owner: Address },
    /// Move `amount` of `asset`; `signer` must own `from`
    Transfer {
        from: Address,
        to: Address,
        asset: AssetId,
        amount: Amount,
        signer: Signer,
    },
    /// Create `amount` of `asset` in `to`; `authority` must be the mint authority
    MintTo {
        asset: AssetId,
        to: Address,
        amount: Amount,
        authority: Signer,
    },
    /// Destroy `amount` of `asset` held by `from`; needs both the holder and the mint authority
    Burn {
        asset: AssetId,
        from: Address,
        amount: Amount,
        owner: Signer,
        authority: Signer,
    },
}

/// Operations that commit together or not at all
#[derive(Debug)]
pub struct LedgerBatch {
    pub correlation_id: String,
    pub ops: Vec<LedgerOp>,
}

impl LedgerBatch {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            ops: Vec::new(),
        }
    }

    pub fn create_mint(mut self, asset: AssetId, authority: Address, decimals: u8) -> Self {
        self.ops.push(LedgerOp::CreateMint {
            asset,
            authority,
            decimals,
        });
        self
    }

    pub fn open_account(mut self, address: Address, owner: Address) -> Self {
        self.ops.push(LedgerOp::OpenAccount { address, owner });
        self
    }

    pub fn transfer(mut self, from: Address, to: Address, asset: AssetId, amount: Amount, signer: Signer) -> Self {
        self.ops.push(LedgerOp::Transfer {
            from,
            to,
            asset,
            amount,
            signer,
        });
        self
    }

    pub fn mint_to(mut self, asset: AssetId, to: Address, amount: Amount, authority: Signer) -> Self {
        self.ops.push(LedgerOp::MintTo {
            asset,
            to,
            amount,
            authority,
        });
        self
    }

    pub fn burn(mut self, asset: AssetId, from: Address, amount: Amount, owner: Signer, authority: Signer) -> Self {
        self.ops.push(LedgerOp::Burn {
            asset,
            from,
            amount,
            owner,
            authority,
        });
        self
    }
}

/// What a committed batch produced
#[derive(Debug, Clone)]
pub struct BatchReceipt {
    pub correlation_id: String,
    pub entries: Vec<EntryId>,
}

// ============================================================================
// Ledger service
// ============================================================================

/// The ledger as seen by the treasury.
///
/// Implementations must apply a batch atomically: if any operation fails,
/// no balance, supply or journal entry may change.
pub trait LedgerService: Send + Sync {
    /// Apply every operation of the batch, or none of them.
    fn apply(&self, batch: LedgerBatch) -> Result<BatchReceipt>;

    /// Balance of an account for an asset (zero if the account is unknown)
    fn balance(&self, account: &Address, asset: &AssetId) -> Amount;

    /// Current supply of a mint
    fn supply(&self, asset: &AssetId) -> Option<Amount>;

    /// Whether an account has been opened
    fn account_exists(&self, account: &Address) -> bool;

    /// Register a program and hand back its only handle.
    ///
    /// Fails with [`LedgerError::ProgramRegistered`] if the program already
    /// has a handle on this ledger.
    fn register_program(&self, program: ProgramId) -> Result<ProgramHandle>;
}

#[derive(Debug, Default, Clone)]
struct LedgerState {
    accounts: HashMap<Address, AccountState>,
    mints: HashMap<AssetId, MintInfo>,
    entries: Vec<LedgerEntry>,
    programs: HashMap<ProgramId, Uuid>,
}

/// Serializable copy of the whole ledger
///
/// Program registrations are not part of it; they belong to the running process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accounts: BTreeMap<Address, AccountState>,
    pub mints: BTreeMap<AssetId, MintInfo>,
    pub entries: Vec<LedgerEntry>,
}

/// The in-memory ledger
///
/// All state sits behind one lock; a batch holds the write lock for its whole
/// validate-and-commit cycle, so batches are serialized.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                accounts: snapshot.accounts.into_iter().collect(),
                mints: snapshot.mints.into_iter().collect(),
                entries: snapshot.entries,
                programs: HashMap::new(),
            }),
        }
    }

    /// Replace balances, mints and the journal with a snapshot, keeping
    /// program registrations.
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        let mut state = self.state.write();
        state.accounts = snapshot.accounts.into_iter().collect();
        state.mints = snapshot.mints.into_iter().collect();
        state.entries = snapshot.entries;
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();
        LedgerSnapshot {
            accounts: state.accounts.iter().map(|(k, v)| (*k, v.clone())).collect(),
            mints: state.mints.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            entries: state.entries.clone(),
        }
    }

    /// Get account state
    pub fn account_state(&self, account: &Address) -> Option<AccountState> {
        self.state.read().accounts.get(account).cloned()
    }

    pub fn mint_info(&self, asset: &AssetId) -> Option<MintInfo> {
        self.state.read().mints.get(asset).cloned()
    }

    /// Get all entries for an account, oldest first
    pub fn account_entries(&self, account: &Address) -> Vec<LedgerEntry> {
        self.state
            .read()
            .entries
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Get the total number of entries
    pub fn entry_count(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Get all account addresses
    pub fn accounts(&self) -> Vec<Address> {
        let mut accounts: Vec<Address> = self.state.read().accounts.keys().copied().collect();
        accounts.sort();
        accounts
    }
}

impl LedgerService for InMemoryLedger {
    fn apply(&self, batch: LedgerBatch) -> Result<BatchReceipt> {
        if batch.ops.is_empty() {
            return Err(LedgerError::EmptyBatch {
                correlation_id: batch.correlation_id,
            });
        }

        let mut state = self.state.write();

        let staged = {
            let mut stage = Stage::new(&state, &batch.correlation_id);
            for op in &batch.ops {
                stage.apply(op)?;
            }
            stage.finish()
        };

        let entry_ids: Vec<EntryId> = staged.entries.iter().map(|e| e.entry_id.clone()).collect();
        state.accounts.extend(staged.accounts);
        state.mints.extend(staged.mints);
        state.entries.extend(staged.entries);

        debug!(
            correlation_id = %batch.correlation_id,
            ops = batch.ops.len(),
            entries = entry_ids.len(),
            "Ledger batch committed"
        );

        Ok(BatchReceipt {
            correlation_id: batch.correlation_id,
            entries: entry_ids,
        })
    }

    fn balance(&self, account: &Address, asset: &AssetId) -> Amount {
        self.state
            .read()
            .accounts
            .get(account)
            .map(|a| a.balance(asset))
            .unwrap_or(Amount::zero())
    }

    fn supply(&self, asset: &AssetId) -> Option<Amount> {
        self.state.read().mints.get(asset).map(|m| m.supply)
    }

    fn account_exists(&self, account: &Address) -> bool {
        self.state.read().accounts.contains_key(account)
    }

    fn register_program(&self, program: ProgramId) -> Result<ProgramHandle> {
        let mut state = self.state.write();
        if state.programs.contains_key(&program) {
            return Err(LedgerError::ProgramRegistered { program });
        }
        let token = Uuid::new_v4();
        state.programs.insert(program, token);
        debug!(program = %program, "Program registered");
        Ok(ProgramHandle { program, token })
    }
}

/// Copy-on-write overlay used while validating a batch
struct Stage<'a> {
    base: &'a LedgerState,
    correlation_id: &'a str,
    accounts: HashMap<Address, AccountState>,
    mints: HashMap<AssetId, MintInfo>,
    entries: Vec<LedgerEntry>,
}

struct Staged {
    accounts: HashMap<Address, AccountState>,
    mints: HashMap<AssetId, MintInfo>,
    entries: Vec<LedgerEntry>,
}

impl<'a> Stage<'a> {
    fn new(base: &'a LedgerState, correlation_id: &'a str) -> Self {
        Self {
            base,
            correlation_id,
            accounts: HashMap::new(),
            mints: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn finish(self) -> Staged {
        Staged {
            accounts: self.accounts,
            mints: self.mints,
            entries: self.entries,
        }
    }

    fn account_exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address) || self.base.accounts.contains_key(address)
    }

    fn account(&mut self, address: &Address) -> Option<&mut AccountState> {
        if !self.accounts.contains_key(address) {
            let existing = self.base.accounts.get(address)?.clone();
            self.accounts.insert(*address, existing);
        }
        self.accounts.get_mut(address)
    }

    fn mint(&mut self, asset: &AssetId) -> Result<&mut MintInfo> {
        if !self.mints.contains_key(asset) {
            let existing = self
                .base
                .mints
                .get(asset)
                .ok_or_else(|| LedgerError::MintNotFound { asset: asset.clone() })?
                .clone();
            self.mints.insert(asset.clone(), existing);
        }
        self.mints
            .get_mut(asset)
            .ok_or_else(|| LedgerError::MintNotFound { asset: asset.clone() })
    }

    fn apply(&mut self, op: &LedgerOp) -> Result<()> {
        let base = self.base;
        let programs = &base.programs;
        match op {
            LedgerOp::CreateMint {
                asset,
                authority,
                decimals,
            } => {
                if self.mints.contains_key(asset) || self.base.mints.contains_key(asset) {
                    return Err(LedgerError::MintExists { asset: asset.clone() });
                }
                self.mints.insert(
                    asset.clone(),
                    MintInfo {
                        asset: asset.clone(),
                        authority: *authority,
                        decimals: *decimals,
                        supply: Amount::zero(),
                    },
                );
                Ok(())
            }
            LedgerOp::OpenAccount { address, owner } => {
                if self.account_exists(address) {
                    return Err(LedgerError::AccountExists { account: *address });
                }
                self.accounts.insert(*address, AccountState::new(*owner));
                Ok(())
            }
            LedgerOp::Transfer {
                from,
                to,
                asset,
                amount,
                signer,
            } => {
                require_positive(*amount)?;
                self.mint(asset)?;
                self.debit(from, asset, *amount, signer, EntryReason::Transfer)?;
                self.credit(to, asset, *amount, EntryReason::Transfer)
            }
            LedgerOp::MintTo {
                asset,
                to,
                amount,
                authority,
            } => {
                require_positive(*amount)?;
                let mint = self.mint(asset)?;
                authority.authorize(&mint.authority, programs)?;
                mint.supply = mint.supply.checked_add(*amount).ok_or_else(|| LedgerError::Overflow {
                    message: format!("supply of {}", asset),
                })?;
                self.credit(to, asset, *amount, EntryReason::Mint)
            }
            LedgerOp::Burn {
                asset,
                from,
                amount,
                owner,
                authority,
            } => {
                require_positive(*amount)?;
                let mint = self.mint(asset)?;
                authority.authorize(&mint.authority, programs)?;
                self.debit(from, asset, *amount, owner, EntryReason::Burn)?;
                let mint = self.mint(asset)?;
                mint.supply = mint.supply.checked_sub(*amount).ok_or_else(|| LedgerError::Overflow {
                    message: format!("supply of {} below zero", asset),
                })?;
                Ok(())
            }
        }
    }

    fn debit(
        &mut self,
        address: &Address,
        asset: &AssetId,
        amount: Amount,
        signer: &Signer,
        reason: EntryReason,
    ) -> Result<()> {
        let correlation_id = self.correlation_id.to_string();
        let base = self.base;
        let programs = &base.programs;
        let account = self
            .account(address)
            .ok_or(LedgerError::AccountNotFound { account: *address })?;
        signer.authorize(&account.owner, programs)?;

        let current = account.balance(asset);
        let new_balance = current
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                account: *address,
                asset: asset.clone(),
                available: current.0,
                required: amount.0,
            })?;
        account.balances.insert(asset.clone(), new_balance);
        account.entry_count += 1;

        self.entries.push(LedgerEntry {
            entry_id: EntryId::new(),
            account: *address,
            asset: asset.clone(),
            entry_type: EntryType::Debit,
            amount,
            balance_after: new_balance,
            reason,
            correlation_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn credit(&mut self, address: &Address, asset: &AssetId, amount: Amount, reason: EntryReason) -> Result<()> {
        let correlation_id = self.correlation_id.to_string();
        if !self.account_exists(address) {
            // Only real identities open implicitly; derived accounts are opened by their owner.
            if !address.is_on_curve() {
                return Err(LedgerError::AccountNotFound { account: *address });
            }
            self.accounts.insert(*address, AccountState::new(*address));
        }
        let account = self
            .account(address)
            .ok_or(LedgerError::AccountNotFound { account: *address })?;

        let new_balance = account
            .balance(asset)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                message: format!("balance of {} in {}", asset, address),
            })?;
        account.balances.insert(asset.clone(), new_balance);
        account.entry_count += 1;

        self.entries.push(LedgerEntry {
            entry_id: EntryId::new(),
            account: *address,
            asset: asset.clone(),
            entry_type: EntryType::Credit,
            amount,
            balance_after: new_balance,
            reason,
            correlation_id,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

fn require_positive(amount: Amount) -> Result<()> {
    if amount.is_zero() {
        return Err(LedgerError::InvalidAmount {
            message: "Amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}
