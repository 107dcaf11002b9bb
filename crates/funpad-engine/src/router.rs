//! # Router
//!
//! Resolves which venue serves an asset and forwards the trade to it.
//! The router owns no balances: every ledger mutation happens inside the
//! venue it dispatches to.
//!
//! Check order: pause → attached value → venue resolution → venue checks.
//! Migration freeze is checked by the engine before the router runs.

use crate::curve::PricingCurve;
use crate::launch;
use crate::market::Market;
use crate::payout::{normalize_referrer, FeePayees, Payout};
use crate::{CallContext, Direction};
use funpad_core::{AssetState, EngineError, EngineResult, FeeSplit, SystemConfig, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// Where an asset trades right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Venue {
    Curve(String),
    Pool(String),
    Retired(String),
}

impl Venue {
    pub fn resolve(market: &Market, asset: &str) -> EngineResult<Venue> {
        let record = market.asset(asset)?;
        Ok(match record.state {
            AssetState::Curve => Venue::Curve(record.id.clone()),
            AssetState::Promoted => Venue::Pool(record.id.clone()),
            AssetState::Retired => Venue::Retired(record.id.clone()),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Venue::Curve(_) => "curve",
            Venue::Pool(_) => "pool",
            Venue::Retired(_) => "retired",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub asset: String,
    pub direction: Direction,
    #[serde(with = "funpad_core::u128_str")]
    pub amount: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub min_out: u128,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    pub asset: String,
    pub venue: String,
    pub trader: String,
    pub direction: Direction,
    #[serde(with = "funpad_core::u128_str")]
    pub amount_in: u128,
    #[serde(with = "funpad_core::u128_str")]
    pub amount_out: u128,
    pub fees: FeeSplit,
    /// Pool LP fee retained in reserves (zero on the curve)
    #[serde(with = "funpad_core::u128_str")]
    pub lp_fee: u128,
    /// This trade exhausted the curve and seeded the pool
    pub promoted: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub venue: String,
    #[serde(with = "funpad_core::u128_str")]
    pub amount_out: u128,
    /// All fees charged, in units of the input asset
    #[serde(with = "funpad_core::u128_str")]
    pub fee: u128,
    pub price_impact_bps: u64,
}

pub fn route_swap(
    cfg: &SystemConfig,
    market: &mut Market,
    ctx: &CallContext,
    req: &SwapRequest,
) -> EngineResult<(TradeReceipt, Option<Payout>)> {
    cfg.require_unpaused()?;
    match req.direction {
        Direction::Buy if ctx.value != req.amount => {
            return Err(EngineError::InvalidParameters(format!(
                "buy of {} needs exactly that much attached value, got {}",
                req.amount, ctx.value
            )));
        }
        Direction::Sell if ctx.value != 0 => {
            return Err(EngineError::InvalidParameters(
                "sell does not accept attached value".to_string(),
            ));
        }
        _ => {}
    }

    let trader = ctx.caller.as_str();
    let referrer = normalize_referrer(req.referrer.as_deref(), trader);
    let venue = Venue::resolve(market, &req.asset)?;
    let label = venue.label().to_string();

    let (receipt, payout) = match venue {
        Venue::Retired(id) => return Err(EngineError::AssetRetired(id)),
        Venue::Curve(id) => {
            let record = market.asset(&id)?.clone();
            let payees = FeePayees {
                protocol: &cfg.fee_recipient,
                referrer,
                creator: &record.creator,
            };
            let fill = {
                let Market { ledger, curves, .. } = &mut *market;
                let curve = curves
                    .get_mut(&id)
                    .ok_or_else(|| EngineError::InvalidParameters(format!("no bonding curve for {}", id)))?;
                match req.direction {
                    Direction::Buy => curve.buy(ledger, &record.fee_schedule, &payees, trader, req.amount, req.min_out)?,
                    Direction::Sell => curve.sell(ledger, &record.fee_schedule, &payees, trader, req.amount, req.min_out)?,
                }
            };
            if fill.exhausted {
                launch::promote(cfg, market, &id, ctx.timestamp)?;
            }
            let receipt = TradeReceipt {
                asset: id,
                venue: label,
                trader: trader.to_string(),
                direction: req.direction,
                amount_in: fill.amount_in,
                amount_out: fill.amount_out,
                fees: fill.fees,
                lp_fee: 0,
                promoted: fill.exhausted,
            };
            (receipt, fill.amount_out)
        }
        Venue::Pool(id) => {
            let record = market.asset(&id)?.clone();
            let payees = FeePayees {
                protocol: &cfg.fee_recipient,
                referrer,
                creator: &record.creator,
            };
            let q = {
                let Market { ledger, pools, .. } = &mut *market;
                let pool = pools
                    .get_mut(&id)
                    .ok_or_else(|| EngineError::InvalidParameters(format!("no swap pool for {}", id)))?;
                pool.swap_in(
                    ledger,
                    &record.fee_schedule,
                    &payees,
                    req.direction,
                    trader,
                    req.amount,
                    req.min_out,
                    ctx.timestamp,
                )?
            };
            let receipt = TradeReceipt {
                asset: id,
                venue: label,
                trader: trader.to_string(),
                direction: req.direction,
                amount_in: req.amount,
                amount_out: q.amount_out,
                fees: q.split,
                lp_fee: q.lp_fee,
                promoted: false,
            };
            (receipt, q.amount_out)
        }
    };

    let payout = match req.direction {
        Direction::Sell if payout > 0 => Some(Payout {
            to: trader.to_string(),
            amount: payout,
        }),
        _ => None,
    };
    Ok((receipt, payout))
}

/// Price a trade at the asset's current venue without mutating anything.
pub fn route_quote(
    market: &Market,
    asset: &str,
    direction: Direction,
    amount: u128,
    has_referrer: bool,
) -> EngineResult<Quote> {
    let venue = Venue::resolve(market, asset)?;
    let label = venue.label().to_string();
    match venue {
        Venue::Retired(id) => Err(EngineError::AssetRetired(id)),
        Venue::Curve(id) => {
            let record = market.asset(&id)?;
            let curve = market
                .curves
                .get(&id)
                .ok_or_else(|| EngineError::InvalidParameters(format!("no bonding curve for {}", id)))?;
            let before = curve.price()?;
            let sold = curve.supply_sold();
            let (amount_out, fee, sold_after) = match direction {
                Direction::Buy => {
                    let q = curve.quote_buy(&record.fee_schedule, has_referrer, amount)?;
                    (q.traded_out, q.split.total(), sold + q.traded_out)
                }
                Direction::Sell => {
                    let q = curve.quote_sell(&record.fee_schedule, has_referrer, amount)?;
                    (q.split.net, q.split.total(), sold - amount)
                }
            };
            let after = curve.kind.price(sold_after, curve.unit)?;
            let moved = before.abs_diff(after);
            let price_impact_bps = if before > 0 {
                (moved.saturating_mul(BPS_DENOMINATOR) / before).min(u64::MAX as u128) as u64
            } else {
                0
            };
            Ok(Quote {
                venue: label,
                amount_out,
                fee,
                price_impact_bps,
            })
        }
        Venue::Pool(id) => {
            let record = market.asset(&id)?;
            let pool = market
                .pools
                .get(&id)
                .ok_or_else(|| EngineError::InvalidParameters(format!("no swap pool for {}", id)))?;
            let q = pool.quote(&record.fee_schedule, has_referrer, direction, amount)?;
            Ok(Quote {
                venue: label,
                amount_out: q.amount_out,
                fee: q.total_fee(),
                price_impact_bps: q.price_impact_bps,
            })
        }
    }
}
