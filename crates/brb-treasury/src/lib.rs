//! BRB Treasury - 1:1 USDC-collateralized issuance
//!
//! The treasury holds USDC collateral in a derived custody vault and issues
//! BRB against it, one for one:
//!
//! 1. `initialize` creates the treasury record, the vault and the BRB mint
//! 2. `mint` moves USDC into the vault and issues the same amount of BRB
//! 3. `burn` destroys BRB and releases the same amount of USDC
//! 4. `set_paused` lets the admin halt new issuance (redemption stays open)
//!
//! # Invariant
//!
//! `total_collateral == total_issued_supply` after every operation, and both
//! match the vault balance and the BRB mint supply in the ledger.
//!
//! # Usage
//!
//! ```ignore
//! let ledger = Arc::new(InMemoryLedger::new());
//! ReserveFaucet::new(AssetId::usdc()).install(ledger.as_ref())?;
//! let treasury = Treasury::new(TreasuryConfig::default(), ledger)?;
//! let record = treasury.initialize(&admin, &AssetId::usdc())?;
//! treasury.mint(&record.address, &user, Amount::new(100_000_000))?;
//! ```

pub mod config;
pub mod error;
pub mod faucet;
pub mod guard;
pub mod record;
pub mod store;
pub mod treasury;

pub use config::TreasuryConfig;
pub use error::{Result, TreasuryError};
pub use faucet::ReserveFaucet;
pub use guard::ensure_admin;
pub use record::{TreasuryRecord, TreasuryStatus, TreasuryView};
pub use store::{StateFile, StoreError};
pub use treasury::{HolderBalances, Treasury};
