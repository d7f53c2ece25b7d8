//! Treasury configuration

use brb_core::{AssetId, ProgramId, DECIMALS};
use serde::{Deserialize, Serialize};

/// Configuration for one treasury deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfig {
    /// Deployment identifier, root of every derived address
    #[serde(default)]
    pub program_id: ProgramId,
    /// Symbol of the issued asset (e.g., "BRB")
    #[serde(default = "default_issued_symbol")]
    pub issued_symbol: String,
    /// Decimals of the issued asset (matches the reserve asset)
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// The reserve (collateral) asset
    #[serde(default = "default_reserve_asset")]
    pub reserve_asset: AssetId,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            program_id: ProgramId::default(),
            issued_symbol: default_issued_symbol(),
            decimals: default_decimals(),
            reserve_asset: default_reserve_asset(),
        }
    }
}

impl TreasuryConfig {
    /// A config with its own program id, for isolated deployments
    pub fn for_deployment(label: &str) -> Self {
        Self {
            program_id: ProgramId::from_label(label),
            ..Self::default()
        }
    }
}

fn default_issued_symbol() -> String {
    "BRB".to_string()
}

fn default_decimals() -> u8 {
    DECIMALS
}

fn default_reserve_asset() -> AssetId {
    AssetId::usdc()
}
