//! Everything that moves with a migration: the ledger, asset records and
//! the venues holding custody.

use crate::bonding_curve::BondingCurve;
use crate::swap_pool::SwapPool;
use funpad_core::{AssetRecord, EngineError, EngineResult, Ledger, NATIVE_ASSET};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Market {
    pub ledger: Ledger,
    pub assets: BTreeMap<String, AssetRecord>,
    pub curves: BTreeMap<String, BondingCurve>,
    pub pools: BTreeMap<String, SwapPool>,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset(&self, id: &str) -> EngineResult<&AssetRecord> {
        self.assets
            .get(id)
            .ok_or_else(|| EngineError::InvalidParameters(format!("unknown asset {}", id)))
    }

    pub fn asset_mut(&mut self, id: &str) -> EngineResult<&mut AssetRecord> {
        self.assets
            .get_mut(id)
            .ok_or_else(|| EngineError::InvalidParameters(format!("unknown asset {}", id)))
    }

    pub fn curve_mut(&mut self, id: &str) -> EngineResult<&mut BondingCurve> {
        self.curves
            .get_mut(id)
            .ok_or_else(|| EngineError::InvalidParameters(format!("no bonding curve for {}", id)))
    }

    /// Assets in launch order.
    pub fn token_list(&self) -> Vec<&AssetRecord> {
        let mut list: Vec<&AssetRecord> = self.assets.values().collect();
        list.sort_by_key(|a| (a.launch_seq, a.created_at));
        list
    }

    pub fn is_pristine(&self) -> bool {
        self.ledger.is_pristine()
            && self.assets.is_empty()
            && self.curves.is_empty()
            && self.pools.is_empty()
    }

    /// Ledger supply audit plus a cross-check that venue reserves match
    /// ledger custody exactly.
    pub fn audit(&self) -> Result<(), String> {
        self.ledger.audit_all()?;

        let mut native_in_venues: u128 = 0;
        for (id, curve) in &self.curves {
            native_in_venues = native_in_venues
                .checked_add(curve.base_reserve)
                .ok_or("native reserve overflow")?;
            let pooled = self.pools.get(id).map(|p| p.traded_reserve).unwrap_or(0);
            let custody = self.ledger.supply(id).map(|s| s.reserved).unwrap_or(0);
            if curve.traded_reserve + pooled != custody {
                return Err(format!(
                    "Venue audit FAILED for {}: curve {} + pool {} != custody {}",
                    id, curve.traded_reserve, pooled, custody
                ));
            }
        }
        for pool in self.pools.values() {
            native_in_venues = native_in_venues
                .checked_add(pool.base_reserve)
                .ok_or("native reserve overflow")?;
        }
        let native_custody = self
            .ledger
            .supply(NATIVE_ASSET)
            .map(|s| s.reserved)
            .unwrap_or(0);
        if native_in_venues != native_custody {
            return Err(format!(
                "Venue audit FAILED for {}: venues hold {} but custody is {}",
                NATIVE_ASSET, native_in_venues, native_custody
            ));
        }
        Ok(())
    }
}
