//! JSON state file shared by the CLI and the server

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brb_ledger::{InMemoryLedger, LedgerSnapshot};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::config::TreasuryConfig;
use crate::error::Result as TreasuryResult;
use crate::record::TreasuryRecord;
use crate::treasury::Treasury;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed state file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything needed to restore a treasury and its ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub config: TreasuryConfig,
    #[serde(default)]
    pub records: Vec<TreasuryRecord>,
    #[serde(default)]
    pub ledger: LedgerSnapshot,
}

impl StateFile {
    /// Load the state, or a fresh one if the file does not exist.
    pub fn load_or_default(path: &Path, config: TreasuryConfig) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self {
                config,
                ..Self::default()
            });
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to a uniquely named temp file in the target directory, sync it
    /// and rename it over `path`.
    ///
    /// Readers see either the old state or the new one. A failed save leaves
    /// no temp file behind.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_vec_pretty(self).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        sync_dir(parent);

        debug!(path = %path.display(), records = self.records.len(), "State saved");
        Ok(())
    }

    /// Build the engine and its ledger. The engine registers the deployment's
    /// program with the fresh ledger.
    pub fn into_treasury(self) -> TreasuryResult<Treasury<InMemoryLedger>> {
        let ledger = Arc::new(InMemoryLedger::from_snapshot(self.ledger));
        Treasury::with_records(self.config, ledger, self.records)
    }

    /// Put a running engine and its ledger back to this state.
    pub fn restore_into(self, treasury: &Treasury<InMemoryLedger>) {
        treasury.ledger().restore(self.ledger);
        treasury.replace_records(self.records);
    }

    pub fn from_treasury(treasury: &Treasury<InMemoryLedger>) -> Self {
        Self {
            config: treasury.config().clone(),
            records: treasury.records(),
            ledger: treasury.ledger().snapshot(),
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), "Directory sync failed: {e}");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faucet::ReserveFaucet;
    use brb_core::{Amount, AssetId, Keypair};
    use brb_ledger::LedgerService;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_fresh_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = StateFile::load_or_default(&path, TreasuryConfig::for_deployment("fresh")).unwrap();
        assert!(state.records.is_empty());
        assert_eq!(state.config, TreasuryConfig::for_deployment("fresh"));
    }

    #[test]
    fn test_save_and_restore() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let treasury = StateFile::default().into_treasury().unwrap();
        let faucet = ReserveFaucet::new(AssetId::usdc());
        faucet.install(treasury.ledger().as_ref()).unwrap();
        let admin = Keypair::from_label("admin").address();
        let user = Keypair::from_label("user").address();
        let address = treasury.initialize(&admin, &AssetId::usdc()).unwrap().address;
        faucet.drip(treasury.ledger().as_ref(), &user, Amount::new(1_000)).unwrap();
        treasury.mint(&address, &user, Amount::new(400)).unwrap();

        StateFile::from_treasury(&treasury).save(&path).unwrap();
        let restored = StateFile::load(&path).unwrap().into_treasury().unwrap();

        assert_eq!(restored.record(&address).unwrap(), treasury.record(&address).unwrap());
        assert_eq!(
            restored.balances(&address, &user).unwrap(),
            treasury.balances(&address, &user).unwrap()
        );

        // The restored treasury keeps operating with its derived signers.
        restored.burn(&address, &user, Amount::new(400)).unwrap();
        let record = restored.record(&address).unwrap();
        assert_eq!(record.total_collateral, Amount::zero());
        assert_eq!(restored.ledger().balance(&user, &AssetId::usdc()), Amount::new(1_000));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(StateFile::load(&path), Err(StoreError::Format { .. })));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("state.json");

        let result = StateFile::default().save(&path);
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        StateFile::default().save(&path).unwrap();
        let second = StateFile {
            config: TreasuryConfig::for_deployment("second"),
            ..StateFile::default()
        };
        second.save(&path).unwrap();

        assert_eq!(StateFile::load(&path).unwrap(), second);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
    }

    #[test]
    fn test_restore_into_rolls_back() {
        let treasury = StateFile::default().into_treasury().unwrap();
        let faucet = ReserveFaucet::new(AssetId::usdc());
        faucet.install(treasury.ledger().as_ref()).unwrap();
        let saved = StateFile::from_treasury(&treasury);

        let admin = Keypair::from_label("admin").address();
        let address = treasury.initialize(&admin, &AssetId::usdc()).unwrap().address;
        saved.clone().restore_into(&treasury);

        assert_eq!(StateFile::from_treasury(&treasury), saved);
        assert!(treasury.record(&address).is_err());
        // The engine keeps its signing rights after a rollback.
        treasury.initialize(&admin, &AssetId::usdc()).unwrap();
    }
}
