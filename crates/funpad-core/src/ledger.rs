//! # Ledger - balance and custody bookkeeping
//!
//! The single authority for who holds what. Every venue (curve, pool) and
//! every fee payout moves value exclusively through these mutators.
//!
//! ## Accounting identity (checked by [`Ledger::audit_supply`])
//! ```text
//! sum(account balances) + reserved == minted - burned      (per asset)
//! ```
//! - `credit` / `debit` mint into / burn out of an account.
//! - `mint_to_reserve` / `burn_reserve` mint into / burn out of venue custody.
//! - `release_reserve` / `absorb_reserve` move value between custody and an account.
//! - `transfer` moves value between two accounts.
//!
//! No mutator ever wraps or clamps: on any overflow/underflow it returns an
//! error before touching state.

use crate::error::{EngineError, EngineResult};
use crate::NATIVE_ASSET;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;

/// Per-asset supply counters.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyRecord {
    #[serde(with = "crate::u128_str")]
    pub cap: u128,
    #[serde(with = "crate::u128_str")]
    pub minted: u128,
    #[serde(with = "crate::u128_str")]
    pub burned: u128,
    /// Amount held in venue custody (curve or pool reserves), not by any account
    #[serde(with = "crate::u128_str")]
    pub reserved: u128,
}

impl SupplyRecord {
    /// Minted minus burned.
    pub fn outstanding(&self) -> u128 {
        self.minted.saturating_sub(self.burned)
    }
}

/// account → balance for a single asset
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Balances(#[serde(with = "crate::u128_map_str")] pub BTreeMap<String, u128>);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    /// asset → account → balance. BTreeMap for deterministic state roots.
    pub balances: BTreeMap<String, Balances>,
    pub supplies: BTreeMap<String, SupplyRecord>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Empty ledger with the native asset registered (uncapped).
    pub fn new() -> Self {
        let mut supplies = BTreeMap::new();
        supplies.insert(
            NATIVE_ASSET.to_string(),
            SupplyRecord {
                cap: u128::MAX,
                ..SupplyRecord::default()
            },
        );
        Self {
            balances: BTreeMap::new(),
            supplies,
        }
    }

    pub fn register_asset(&mut self, asset: &str, cap: u128) -> EngineResult<()> {
        if asset.is_empty() || cap == 0 {
            return Err(EngineError::InvalidParameters(
                "asset id must be non-empty and cap > 0".to_string(),
            ));
        }
        if self.supplies.contains_key(asset) {
            return Err(EngineError::InvalidParameters(format!(
                "asset {} already registered",
                asset
            )));
        }
        self.supplies.insert(
            asset.to_string(),
            SupplyRecord {
                cap,
                ..SupplyRecord::default()
            },
        );
        Ok(())
    }

    pub fn supply(&self, asset: &str) -> Option<&SupplyRecord> {
        self.supplies.get(asset)
    }

    pub fn balance_of(&self, asset: &str, account: &str) -> u128 {
        self.balances
            .get(asset)
            .and_then(|b| b.0.get(account))
            .copied()
            .unwrap_or(0)
    }

    /// Mint `amount` of `asset` directly into `account`.
    pub fn credit(&mut self, asset: &str, account: &str, amount: u128) -> EngineResult<()> {
        let minted = self.checked_mint(asset, amount)?;
        let balance = self
            .balance_of(asset, account)
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("credit balance"))?;
        self.supply_mut(asset)?.minted = minted;
        self.set_balance(asset, account, balance);
        Ok(())
    }

    /// Burn `amount` of `asset` out of `account`.
    pub fn debit(&mut self, asset: &str, account: &str, amount: u128) -> EngineResult<()> {
        let balance = self.checked_debit(asset, account, amount)?;
        let burned = self.checked_burn(asset, amount)?;
        self.supply_mut(asset)?.burned = burned;
        self.set_balance(asset, account, balance);
        Ok(())
    }

    /// Move `amount` from `from` to `to`. Both legs or neither.
    pub fn transfer(&mut self, asset: &str, from: &str, to: &str, amount: u128) -> EngineResult<()> {
        self.require_asset(asset)?;
        let from_balance = self.checked_debit(asset, from, amount)?;
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("transfer credit"))?;
        self.set_balance(asset, from, from_balance);
        self.set_balance(asset, to, to_balance);
        Ok(())
    }

    /// Mint `amount` into venue custody (launch supply, attached native value).
    pub fn mint_to_reserve(&mut self, asset: &str, amount: u128) -> EngineResult<()> {
        let minted = self.checked_mint(asset, amount)?;
        let supply = self.supply_mut(asset)?;
        let reserved = supply
            .reserved
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("reserve mint"))?;
        supply.minted = minted;
        supply.reserved = reserved;
        Ok(())
    }

    /// Burn `amount` out of venue custody (native value leaving via external payout).
    pub fn burn_reserve(&mut self, asset: &str, amount: u128) -> EngineResult<()> {
        let burned = self.checked_burn(asset, amount)?;
        let supply = self.supply_mut(asset)?;
        let reserved = supply
            .reserved
            .checked_sub(amount)
            .ok_or_else(|| EngineError::overflow("reserve burn underflow"))?;
        supply.burned = burned;
        supply.reserved = reserved;
        Ok(())
    }

    /// Move `amount` out of venue custody into `to`.
    pub fn release_reserve(&mut self, asset: &str, to: &str, amount: u128) -> EngineResult<()> {
        let reserved = self
            .require_asset(asset)?
            .reserved
            .checked_sub(amount)
            .ok_or_else(|| EngineError::overflow("reserve release underflow"))?;
        let balance = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("reserve release credit"))?;
        self.supply_mut(asset)?.reserved = reserved;
        self.set_balance(asset, to, balance);
        Ok(())
    }

    /// Move `amount` from `from` into venue custody.
    pub fn absorb_reserve(&mut self, asset: &str, from: &str, amount: u128) -> EngineResult<()> {
        let balance = self.checked_debit(asset, from, amount)?;
        let reserved = self
            .require_asset(asset)?
            .reserved
            .checked_add(amount)
            .ok_or_else(|| EngineError::overflow("reserve absorb"))?;
        self.supply_mut(asset)?.reserved = reserved;
        self.set_balance(asset, from, balance);
        Ok(())
    }

    /// Sum of all account balances for `asset` (custody excluded).
    pub fn total_balances(&self, asset: &str) -> EngineResult<u128> {
        let mut total: u128 = 0;
        if let Some(b) = self.balances.get(asset) {
            for v in b.0.values() {
                total = total
                    .checked_add(*v)
                    .ok_or_else(|| EngineError::overflow("balance sum"))?;
            }
        }
        Ok(total)
    }

    /// Per-asset account totals, for conservation checks around migration.
    pub fn asset_totals(&self) -> BTreeMap<String, u128> {
        self.supplies
            .keys()
            .map(|a| (a.clone(), self.total_balances(a).unwrap_or(u128::MAX)))
            .collect()
    }

    /// Supply invariant audit for one asset.
    ///
    /// Verifies: sum(balances) + reserved == minted - burned, and minted <= cap.
    /// A failure indicates a bug in a venue, never a user error.
    pub fn audit_supply(&self, asset: &str) -> Result<(), String> {
        let supply = self
            .supplies
            .get(asset)
            .ok_or_else(|| format!("Supply audit: unknown asset {}", asset))?;
        let balances = self.total_balances(asset).map_err(|e| e.to_string())?;
        let accounted = balances
            .checked_add(supply.reserved)
            .ok_or_else(|| format!("Supply audit FAILED for {}: accounted supply overflows", asset))?;
        if supply.minted > supply.cap {
            return Err(format!(
                "Supply audit FAILED for {}: minted {} exceeds cap {}",
                asset, supply.minted, supply.cap
            ));
        }
        if accounted != supply.outstanding() {
            return Err(format!(
                "Supply audit FAILED for {}: balances={} + reserved={} != minted={} - burned={}",
                asset, balances, supply.reserved, supply.minted, supply.burned
            ));
        }
        Ok(())
    }

    pub fn audit_all(&self) -> Result<(), String> {
        for asset in self.supplies.keys() {
            self.audit_supply(asset)?;
        }
        Ok(())
    }

    /// Deterministic root over supplies and balances (SHA3-256, sorted order).
    pub fn state_root(&self) -> String {
        let mut hasher = Sha3_256::new();
        for (asset, s) in &self.supplies {
            hasher.update(asset.as_bytes());
            hasher.update(s.cap.to_le_bytes());
            hasher.update(s.minted.to_le_bytes());
            hasher.update(s.burned.to_le_bytes());
            hasher.update(s.reserved.to_le_bytes());
        }
        for (asset, b) in &self.balances {
            hasher.update(asset.as_bytes());
            for (account, v) in &b.0 {
                hasher.update(account.as_bytes());
                hasher.update(v.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    /// True when nothing besides the empty native record exists.
    pub fn is_pristine(&self) -> bool {
        self.balances.values().all(|b| b.0.is_empty())
            && self
                .supplies
                .iter()
                .all(|(a, s)| a == NATIVE_ASSET && s.minted == 0 && s.burned == 0)
    }

    /// Accounts holding a non-zero balance of `asset`.
    pub fn holders(&self, asset: &str) -> Vec<(String, u128)> {
        self.balances
            .get(asset)
            .map(|b| b.0.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    // ── internal helpers ──

    fn require_asset(&self, asset: &str) -> EngineResult<&SupplyRecord> {
        self.supplies
            .get(asset)
            .ok_or_else(|| EngineError::InvalidParameters(format!("unknown asset {}", asset)))
    }

    fn supply_mut(&mut self, asset: &str) -> EngineResult<&mut SupplyRecord> {
        self.supplies
            .get_mut(asset)
            .ok_or_else(|| EngineError::InvalidParameters(format!("unknown asset {}", asset)))
    }

    fn checked_mint(&self, asset: &str, amount: u128) -> EngineResult<u128> {
        let supply = self.require_asset(asset)?;
        supply
            .minted
            .checked_add(amount)
            .filter(|m| *m <= supply.cap)
            .ok_or_else(|| EngineError::overflow("mint exceeds supply cap"))
    }

    fn checked_burn(&self, asset: &str, amount: u128) -> EngineResult<u128> {
        let supply = self.require_asset(asset)?;
        supply
            .burned
            .checked_add(amount)
            .filter(|b| *b <= supply.minted)
            .ok_or_else(|| EngineError::overflow("burn exceeds minted supply"))
    }

    fn checked_debit(&self, asset: &str, account: &str, amount: u128) -> EngineResult<u128> {
        self.require_asset(asset)?;
        let have = self.balance_of(asset, account);
        have.checked_sub(amount)
            .ok_or_else(|| EngineError::InsufficientBalance {
                asset: asset.to_string(),
                account: account.to_string(),
                have,
                need: amount,
            })
    }

    fn set_balance(&mut self, asset: &str, account: &str, value: u128) {
        let entry = self.balances.entry(asset.to_string()).or_default();
        if value == 0 {
            entry.0.remove(account);
        } else {
            entry.0.insert(account.to_string(), value);
        }
    }
}
