//! # Constant-product swap pool
//!
//! `amount_out = (input_after_fee * reserve_out) / (reserve_in + input_after_fee)`
//!
//! A swap pays the fee schedule (protocol + referrer, no creator share) out
//! of the input, then charges `lp_fee_bps` on the remainder. The LP fee stays
//! in the reserves, so `base * traded` never decreases across a swap.
//! Reserves are set once, at promotion, and only move through swaps after that.

use crate::curve::{mul_div, PRICE_SCALE};
use crate::payout::FeePayees;
use crate::Direction;
use funpad_core::fees::bps_of;
use funpad_core::{
    EngineError, EngineResult, FeeSchedule, FeeSplit, Ledger, BPS_DENOMINATOR, MAX_POOL_LP_FEE_BPS,
    NATIVE_ASSET,
};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SwapPool {
    pub asset: String,
    #[serde(with = "funpad_core::u128_str")]
    pub base_reserve: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub traded_reserve: u128,
    pub lp_fee_bps: u64,
    #[serde(with = "funpad_core::u128_str")]
    pub fees_collected_base: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub fees_collected_traded: u128,
    pub created_at: u64,
    pub last_trade: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolQuote {
    pub split: FeeSplit,
    #[serde(with = "funpad_core::u128_str")]
    pub lp_fee: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub amount_out: u128,
    pub price_impact_bps: u64,
}

impl PoolQuote {
    /// Schedule fees plus the LP fee, in units of the input asset.
    pub fn total_fee(&self) -> u128 {
        self.split.total() + self.lp_fee
    }
}

impl SwapPool {
    pub fn seed(
        asset: &str,
        base_reserve: u128,
        traded_reserve: u128,
        lp_fee_bps: u64,
        now: u64,
    ) -> EngineResult<Self> {
        if base_reserve == 0 || traded_reserve == 0 {
            return Err(EngineError::InvalidParameters(format!(
                "pool {} needs both reserves > 0 (base {}, traded {})",
                asset, base_reserve, traded_reserve
            )));
        }
        if lp_fee_bps as u128 > MAX_POOL_LP_FEE_BPS {
            return Err(EngineError::InvalidParameters(format!(
                "lp fee {} bps exceeds max {}",
                lp_fee_bps, MAX_POOL_LP_FEE_BPS
            )));
        }
        Ok(Self {
            asset: asset.to_string(),
            base_reserve,
            traded_reserve,
            lp_fee_bps,
            fees_collected_base: 0,
            fees_collected_traded: 0,
            created_at: now,
            last_trade: now,
        })
    }

    /// `base_reserve * traded_reserve`
    pub fn product(&self) -> EngineResult<u128> {
        self.base_reserve
            .checked_mul(self.traded_reserve)
            .ok_or_else(|| EngineError::overflow("pool invariant"))
    }

    /// Native per whole token, scaled like curve prices.
    pub fn spot_price(&self, unit: u128) -> EngineResult<u128> {
        let per_atomic = mul_div(self.base_reserve, PRICE_SCALE, self.traded_reserve)?;
        per_atomic
            .checked_mul(unit)
            .ok_or_else(|| EngineError::overflow("pool spot price"))
    }

    fn reserves(&self, direction: Direction) -> (u128, u128) {
        match direction {
            Direction::Buy => (self.base_reserve, self.traded_reserve),
            Direction::Sell => (self.traded_reserve, self.base_reserve),
        }
    }

    /// Price a swap without touching state.
    pub fn quote(
        &self,
        fees: &FeeSchedule,
        has_referrer: bool,
        direction: Direction,
        amount_in: u128,
    ) -> EngineResult<PoolQuote> {
        if amount_in == 0 {
            return Err(EngineError::InvalidParameters(
                "swap amount must be > 0".to_string(),
            ));
        }
        let (reserve_in, reserve_out) = self.reserves(direction);
        let split = fees.split(amount_in, has_referrer, false)?;
        let lp_fee = bps_of(split.net, self.lp_fee_bps as u128)?;
        let effective_in = split.net - lp_fee;

        let numerator = effective_in
            .checked_mul(reserve_out)
            .ok_or_else(|| EngineError::overflow("swap output numerator"))?;
        let denominator = reserve_in
            .checked_add(effective_in)
            .ok_or_else(|| EngineError::overflow("swap output denominator"))?;
        let amount_out = numerator / denominator;

        // Impact of execution price versus spot, both scaled
        let spot = mul_div(reserve_out, PRICE_SCALE, reserve_in)?;
        let exec = mul_div(amount_out, PRICE_SCALE, amount_in)?;
        let price_impact_bps = if spot > exec {
            ((spot - exec) * BPS_DENOMINATOR / spot) as u64
        } else {
            0
        };

        Ok(PoolQuote {
            split,
            lp_fee,
            amount_out,
            price_impact_bps,
        })
    }

    /// Execute a swap. Buys take attached native value into custody and
    /// release tokens to the trader; sells absorb the trader's tokens and
    /// burn the native output from custody for the caller to pay out.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_in(
        &mut self,
        ledger: &mut Ledger,
        fees: &FeeSchedule,
        payees: &FeePayees,
        direction: Direction,
        trader: &str,
        amount_in: u128,
        min_out: u128,
        now: u64,
    ) -> EngineResult<PoolQuote> {
        let q = self.quote(fees, payees.has_referrer(), direction, amount_in)?;
        if q.amount_out < min_out {
            return Err(EngineError::SlippageExceeded {
                min_out,
                actual: q.amount_out,
            });
        }
        if q.amount_out == 0 {
            return Err(EngineError::InvalidParameters(format!(
                "swap of {} into {} yields nothing",
                amount_in, self.asset
            )));
        }
        let (_, reserve_out) = self.reserves(direction);
        if q.amount_out >= reserve_out {
            return Err(EngineError::InsufficientLiquidity {
                reserve_out,
                amount_out: q.amount_out,
            });
        }

        let k_before = self.product()?;
        let fee_total = q.total_fee();
        match direction {
            Direction::Buy => {
                ledger.mint_to_reserve(NATIVE_ASSET, amount_in)?;
                payees.distribute(ledger, NATIVE_ASSET, &q.split)?;
                ledger.release_reserve(&self.asset, trader, q.amount_out)?;
                self.base_reserve = self
                    .base_reserve
                    .checked_add(q.split.net)
                    .ok_or_else(|| EngineError::overflow("pool base reserve"))?;
                self.traded_reserve -= q.amount_out;
                self.fees_collected_base = self
                    .fees_collected_base
                    .checked_add(fee_total)
                    .ok_or_else(|| EngineError::overflow("pool base fees"))?;
            }
            Direction::Sell => {
                ledger.absorb_reserve(&self.asset, trader, amount_in)?;
                payees.distribute(ledger, &self.asset, &q.split)?;
                ledger.burn_reserve(NATIVE_ASSET, q.amount_out)?;
                self.traded_reserve = self
                    .traded_reserve
                    .checked_add(q.split.net)
                    .ok_or_else(|| EngineError::overflow("pool traded reserve"))?;
                self.base_reserve -= q.amount_out;
                self.fees_collected_traded = self
                    .fees_collected_traded
                    .checked_add(fee_total)
                    .ok_or_else(|| EngineError::overflow("pool traded fees"))?;
            }
        }
        self.last_trade = now;

        let k_after = self.product()?;
        if k_after < k_before {
            return Err(EngineError::InsufficientLiquidity {
                reserve_out,
                amount_out: q.amount_out,
            });
        }

        debug!(
            "pool swap {} {:?}: {} in {} out (k {} -> {})",
            self.asset, direction, amount_in, q.amount_out, k_before, k_after
        );
        Ok(q)
    }
}
