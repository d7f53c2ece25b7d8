//! Command implementations
//!
//! Every command loads the state file, runs against an in-memory treasury and
//! writes the state back if anything changed.

pub mod ledger;
pub mod treasury;

use std::path::{Path, PathBuf};

use anyhow::Context;
use brb_core::{Address, Keypair};
use brb_ledger::InMemoryLedger;
use brb_treasury::{ReserveFaucet, StateFile, Treasury, TreasuryConfig};

/// A loaded state file
pub struct Session {
    path: PathBuf,
    pub treasury: Treasury<InMemoryLedger>,
}

impl Session {
    pub fn open(path: &Path, config: TreasuryConfig) -> anyhow::Result<Self> {
        let state = StateFile::load_or_default(path, config)
            .with_context(|| format!("loading state from {}", path.display()))?;
        let treasury = state.into_treasury().context("starting the treasury engine")?;
        Ok(Self {
            path: path.to_path_buf(),
            treasury,
        })
    }

    pub fn save(&self) -> anyhow::Result<()> {
        StateFile::from_treasury(&self.treasury)
            .save(&self.path)
            .with_context(|| format!("saving state to {}", self.path.display()))
    }

    pub fn faucet(&self) -> ReserveFaucet {
        ReserveFaucet::new(self.treasury.config().reserve_asset.clone())
    }

    /// Address of this deployment's treasury, whether or not it exists yet
    pub fn treasury_address(&self) -> anyhow::Result<Address> {
        Ok(self.treasury.treasury_address()?)
    }
}

/// A name resolves to its demo keypair; 64 hex characters are taken as a raw address.
pub fn resolve_identity(who: &str) -> Address {
    if who.len() == 64 {
        if let Ok(address) = who.parse() {
            return address;
        }
    }
    Keypair::from_label(who).address()
}
