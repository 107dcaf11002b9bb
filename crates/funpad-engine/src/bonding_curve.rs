//! # Bonding curve venue
//!
//! Sells a launched asset from a pre-minted reserve along a [`CurveKind`]
//! price function until `raised` reaches the raise target.
//!
//! ## Reserve accounting
//! - `traded_reserve`: unsold supply, held in ledger custody. Starts at the cap.
//! - `base_reserve`: native value backing the sold supply (net of fees).
//! - `raised`: gross native accepted on buys minus gross released on sells.
//!
//! The curve never touches an account balance except through the [`Ledger`]
//! custody mutators, so `sum(balances) + reserved == minted - burned` holds
//! after every trade.

use crate::curve::{PricingCurve, Rounding};
use crate::payout::FeePayees;
use funpad_core::{CurveKind, EngineError, EngineResult, FeeSchedule, FeeSplit, Ledger, NATIVE_ASSET};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BondingCurve {
    pub asset: String,
    pub kind: CurveKind,
    /// Atomic units per whole token
    #[serde(with = "funpad_core::u128_str")]
    pub unit: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub supply_cap: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub base_reserve: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub traded_reserve: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub raised: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub raise_target: u128,
    /// Cumulative native fees taken by this curve
    #[serde(with = "funpad_core::u128_str")]
    pub fees_collected: u128,
    pub exhausted: bool,
}

/// Priced but not yet executed buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyQuote {
    pub split: FeeSplit,
    pub traded_out: u128,
}

/// Priced but not yet executed sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellQuote {
    pub gross: u128,
    pub split: FeeSplit,
}

/// Result of an executed curve trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveFill {
    pub amount_in: u128,
    pub amount_out: u128,
    pub fees: FeeSplit,
    /// The trade brought `raised` to the target
    pub exhausted: bool,
}

impl BondingCurve {
    /// Rejects a target the curve can't reach before selling out the cap.
    pub fn new(
        asset: &str,
        kind: CurveKind,
        unit: u128,
        supply_cap: u128,
        raise_target: u128,
    ) -> EngineResult<Self> {
        if raise_target == 0 {
            return Err(EngineError::InvalidParameters(
                "raise target must be > 0".to_string(),
            ));
        }
        if unit == 0 || supply_cap == 0 {
            return Err(EngineError::InvalidParameters(
                "unit and supply cap must be > 0".to_string(),
            ));
        }
        kind.validate(supply_cap)?;
        let at_target = kind.supply_for_cost(0, raise_target, unit)?;
        if at_target >= supply_cap {
            return Err(EngineError::InvalidParameters(format!(
                "curve sells out the {} cap before raising {}",
                supply_cap, raise_target
            )));
        }
        Ok(Self {
            asset: asset.to_string(),
            kind,
            unit,
            supply_cap,
            base_reserve: 0,
            traded_reserve: supply_cap,
            raised: 0,
            raise_target,
            fees_collected: 0,
            exhausted: false,
        })
    }

    pub fn supply_sold(&self) -> u128 {
        self.supply_cap - self.traded_reserve
    }

    /// Spot price at the current supply.
    pub fn price(&self) -> EngineResult<u128> {
        self.kind.price(self.supply_sold(), self.unit)
    }

    pub fn quote_buy(&self, fees: &FeeSchedule, has_referrer: bool, base_in: u128) -> EngineResult<BuyQuote> {
        if base_in == 0 {
            return Err(EngineError::InvalidParameters(
                "buy amount must be > 0".to_string(),
            ));
        }
        let raised_after = self
            .raised
            .checked_add(base_in)
            .ok_or_else(|| EngineError::overflow("raise progress"))?;
        if self.exhausted || raised_after > self.raise_target {
            return Err(EngineError::CurveExhausted(self.asset.clone()));
        }
        let split = fees.split(base_in, has_referrer, true)?;
        let traded_out = self
            .kind
            .supply_for_cost(self.supply_sold(), split.net, self.unit)?;
        if traded_out > self.traded_reserve {
            return Err(EngineError::CurveExhausted(self.asset.clone()));
        }
        Ok(BuyQuote { split, traded_out })
    }

    pub fn quote_sell(&self, fees: &FeeSchedule, has_referrer: bool, traded_in: u128) -> EngineResult<SellQuote> {
        if traded_in == 0 {
            return Err(EngineError::InvalidParameters(
                "sell amount must be > 0".to_string(),
            ));
        }
        if self.exhausted {
            return Err(EngineError::CurveExhausted(self.asset.clone()));
        }
        let sold = self.supply_sold();
        if traded_in > sold {
            return Err(EngineError::InvalidParameters(format!(
                "sell of {} exceeds sold supply {}",
                traded_in, sold
            )));
        }
        let gross = self
            .kind
            .cost(sold - traded_in, sold, self.unit, Rounding::Down)?;
        if gross == 0 {
            return Err(EngineError::InvalidParameters(format!(
                "sell of {} pays out nothing",
                traded_in
            )));
        }
        if gross > self.base_reserve {
            return Err(EngineError::InsufficientReserve {
                available: self.base_reserve,
                requested: gross,
            });
        }
        let split = fees.split(gross, has_referrer, true)?;
        Ok(SellQuote { gross, split })
    }

    /// Buy with `base_in` of attached native value. The value is minted into
    /// custody, fee shares are released to their payees and `traded_out`
    /// leaves the traded reserve for the buyer.
    pub fn buy(
        &mut self,
        ledger: &mut Ledger,
        fees: &FeeSchedule,
        payees: &FeePayees,
        buyer: &str,
        base_in: u128,
        min_traded_out: u128,
    ) -> EngineResult<CurveFill> {
        let q = self.quote_buy(fees, payees.has_referrer(), base_in)?;
        if q.traded_out < min_traded_out {
            return Err(EngineError::SlippageExceeded {
                min_out: min_traded_out,
                actual: q.traded_out,
            });
        }
        if q.traded_out == 0 {
            return Err(EngineError::InvalidParameters(format!(
                "{} native buys zero {}",
                base_in, self.asset
            )));
        }

        ledger.mint_to_reserve(NATIVE_ASSET, base_in)?;
        payees.distribute(ledger, NATIVE_ASSET, &q.split)?;
        ledger.release_reserve(&self.asset, buyer, q.traded_out)?;

        self.base_reserve = self
            .base_reserve
            .checked_add(q.split.net)
            .ok_or_else(|| EngineError::overflow("curve base reserve"))?;
        self.traded_reserve -= q.traded_out;
        self.raised += base_in;
        self.fees_collected = self
            .fees_collected
            .checked_add(q.split.total())
            .ok_or_else(|| EngineError::overflow("curve fee total"))?;
        if self.raised == self.raise_target {
            self.exhausted = true;
        }

        debug!(
            "curve buy {}: {} paid {} for {} (raised {}/{})",
            self.asset, buyer, base_in, q.traded_out, self.raised, self.raise_target
        );
        Ok(CurveFill {
            amount_in: base_in,
            amount_out: q.traded_out,
            fees: q.split,
            exhausted: self.exhausted,
        })
    }

    /// Sell `traded_in` back to the curve. Fee shares stay in the ledger as
    /// payee balances; the net amount is burned from custody and must be
    /// paid to the seller by the caller.
    pub fn sell(
        &mut self,
        ledger: &mut Ledger,
        fees: &FeeSchedule,
        payees: &FeePayees,
        seller: &str,
        traded_in: u128,
        min_base_out: u128,
    ) -> EngineResult<CurveFill> {
        let have = ledger.balance_of(&self.asset, seller);
        if have < traded_in {
            return Err(EngineError::InsufficientBalance {
                asset: self.asset.clone(),
                account: seller.to_string(),
                have,
                need: traded_in,
            });
        }
        let q = self.quote_sell(fees, payees.has_referrer(), traded_in)?;
        if q.split.net < min_base_out {
            return Err(EngineError::SlippageExceeded {
                min_out: min_base_out,
                actual: q.split.net,
            });
        }

        ledger.absorb_reserve(&self.asset, seller, traded_in)?;
        payees.distribute(ledger, NATIVE_ASSET, &q.split)?;
        ledger.burn_reserve(NATIVE_ASSET, q.split.net)?;

        self.base_reserve -= q.gross;
        self.traded_reserve += traded_in;
        self.raised = self
            .raised
            .checked_sub(q.gross)
            .ok_or_else(|| EngineError::overflow("raise progress underflow"))?;
        self.fees_collected = self
            .fees_collected
            .checked_add(q.split.total())
            .ok_or_else(|| EngineError::overflow("curve fee total"))?;

        debug!(
            "curve sell {}: {} sold {} for {} net (raised {}/{})",
            self.asset, seller, traded_in, q.split.net, self.raised, self.raise_target
        );
        Ok(CurveFill {
            amount_in: traded_in,
            amount_out: q.split.net,
            fees: q.split,
            exhausted: false,
        })
    }

    /// Hand both reserves over to a pool. Custody in the ledger is untouched;
    /// only the venue owning it changes.
    pub fn drain_for_promotion(&mut self) -> EngineResult<(u128, u128)> {
        if !self.exhausted {
            return Err(EngineError::InvalidParameters(format!(
                "curve {} has not reached its target",
                self.asset
            )));
        }
        let reserves = (self.base_reserve, self.traded_reserve);
        self.base_reserve = 0;
        self.traded_reserve = 0;
        Ok(reserves)
    }
}
