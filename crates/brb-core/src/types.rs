//! Canonical types for the BRB treasury
//!
//! Addresses are raw 32-byte values. They travel as lowercase hex in JSON,
//! on the command line and in logs.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::sha256;
use crate::error::{CoreError, Result};

// ============================================================================
// Identity Types
// ============================================================================

/// A 32-byte account identifier
///
/// Caller identities are Ed25519 public keys and therefore valid curve
/// points. Derived addresses (see [`crate::derive`]) are never on the curve.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether these bytes decode to a point on the Ed25519 curve.
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }

    /// First eight hex characters, for log lines and tables.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| CoreError::InvalidAddress {
            message: format!("not hex: {}", e),
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| CoreError::InvalidAddress {
            message: "address must be 32 bytes".to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of one treasury deployment
///
/// Plays the role of the root parent for the treasury's own derived address,
/// so two deployments never share a treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub Address);

impl ProgramId {
    /// Deterministic program id for a deployment label.
    pub fn from_label(label: &str) -> Self {
        Self(Address(sha256(format!("brb-program:{}", label).as_bytes())))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn as_address(&self) -> &Address {
        &self.0
    }
}

impl Default for ProgramId {
    fn default() -> Self {
        Self::from_label("brb-treasury")
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProgramId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(Self)
    }
}

// ============================================================================
// Asset Types
// ============================================================================

/// Unique identifier for an asset held in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The canonical reserve asset
    pub fn usdc() -> Self {
        Self("USDC".to_string())
    }

    /// Asset id of a mint living at a derived address
    pub fn from_mint(mint: &Address) -> Self {
        Self(format!("mint:{}", mint.to_hex()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Amount Types
// ============================================================================

/// Number of fractional decimal digits for both assets
pub const DECIMALS: u8 = 6;

/// Smallest units in one whole token (10^DECIMALS)
pub const UNITS_PER_TOKEN: u64 = 1_000_000;

/// An amount in smallest units (1.00 token = 1_000_000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a human decimal such as `"100"`, `"1.5"` or `"0.000001"`.
    pub fn from_decimal_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |message: &str| CoreError::InvalidAmount {
            message: format!("{}: {:?}", message, s),
        };

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty amount"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }
        if frac.len() > DECIMALS as usize {
            return Err(invalid("too many fractional digits"));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded.parse().map_err(|_| invalid("not a decimal number"))?
        };

        whole
            .checked_mul(UNITS_PER_TOKEN)
            .and_then(|units| units.checked_add(frac_units))
            .map(Self)
            .ok_or_else(|| invalid("amount too large"))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / UNITS_PER_TOKEN,
            self.0 % UNITS_PER_TOKEN
        )
    }
}
