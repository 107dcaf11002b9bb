//! # Launched asset records
//!
//! Metadata is validated the same way for every launch; lifecycle moves
//! only forward: `Curve → Promoted → Retired`.

use crate::error::{EngineError, EngineResult};
use crate::fees::FeeSchedule;
use serde::{Deserialize, Serialize};

/// Descriptive metadata supplied at launch. Stored verbatim; only the
/// name/symbol/URL lengths are checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Human-readable name (e.g. "Pepe Classic")
    pub name: String,
    /// Ticker symbol, max 10 characters
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub telegram: String,
    #[serde(default)]
    pub website: String,
}

const MAX_NAME_LEN: usize = 64;
const MAX_SYMBOL_LEN: usize = 10;
const MAX_DESCRIPTION_LEN: usize = 1_024;
const MAX_LINK_LEN: usize = 256;

impl AssetMetadata {
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() || self.name.len() > MAX_NAME_LEN {
            return Err(EngineError::InvalidParameters(format!(
                "name must be 1-{} characters",
                MAX_NAME_LEN
            )));
        }
        if self.symbol.is_empty()
            || self.symbol.len() > MAX_SYMBOL_LEN
            || !self.symbol.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(EngineError::InvalidParameters(format!(
                "symbol must be 1-{} ASCII alphanumeric characters",
                MAX_SYMBOL_LEN
            )));
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::InvalidParameters(
                "description too long".to_string(),
            ));
        }
        for link in [&self.image, &self.twitter, &self.telegram, &self.website] {
            if link.len() > MAX_LINK_LEN {
                return Err(EngineError::InvalidParameters(format!(
                    "links must be at most {} characters",
                    MAX_LINK_LEN
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetState {
    /// Trading on the bonding curve
    Curve,
    /// Curve exhausted, liquidity lives in a swap pool
    Promoted,
    /// Admin-retired, no trading
    Retired,
}

impl AssetState {
    pub fn can_transition_to(self, next: AssetState) -> bool {
        matches!(
            (self, next),
            (AssetState::Curve, AssetState::Promoted) | (AssetState::Promoted, AssetState::Retired)
        )
    }
}

impl std::fmt::Display for AssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AssetState::Curve => write!(f, "Curve"),
            AssetState::Promoted => write!(f, "Promoted"),
            AssetState::Retired => write!(f, "Retired"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: String,
    pub metadata: AssetMetadata,
    #[serde(with = "crate::u128_str")]
    pub supply_cap: u128,
    pub decimals: u8,
    pub creator: String,
    pub created_at: u64,
    pub state: AssetState,
    #[serde(with = "crate::u128_str")]
    pub raise_target: u128,
    pub fee_schedule: FeeSchedule,
    /// Launch sequence number on the instance that created it
    pub launch_seq: u64,
}

impl AssetRecord {
    /// Apply a lifecycle transition, rejecting anything but the two legal moves.
    pub fn transition(&mut self, next: AssetState) -> EngineResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(EngineError::InvalidParameters(format!(
                "illegal lifecycle transition {} -> {} for {}",
                self.state, next, self.id
            )));
        }
        self.state = next;
        Ok(())
    }

    /// One whole token in atomic units.
    pub fn unit(&self) -> u128 {
        10u128.pow(self.decimals as u32)
    }
}
