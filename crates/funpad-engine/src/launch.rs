//! # Launches and promotion
//!
//! A launch validates the request, registers the asset with the ledger,
//! mints the full supply cap into curve custody, books the creation fee and
//! spends any surplus value as the creator's first buy. Promotion moves an
//! exhausted curve's reserves into a freshly seeded [`SwapPool`].

use crate::bonding_curve::BondingCurve;
use crate::market::Market;
use crate::payout::FeePayees;
use crate::router::TradeReceipt;
use crate::swap_pool::SwapPool;
use crate::{CallContext, Direction};
use funpad_core::{
    derive_id, AssetMetadata, AssetRecord, AssetState, EngineError, EngineResult, FeeSchedule,
    SystemConfig, NATIVE_ASSET,
};
use log::info;
use serde::{Deserialize, Serialize};

/// Asset id prefix
pub const ASSET_ID_PREFIX: &str = "FUNa";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub metadata: AssetMetadata,
    #[serde(with = "funpad_core::u128_str")]
    pub raise_target: u128,
    /// Falls back to the system default schedule
    #[serde(default)]
    pub fee_schedule: Option<FeeSchedule>,
}

impl LaunchRequest {
    pub fn new(name: &str, symbol: &str, raise_target: u128) -> Self {
        Self {
            metadata: AssetMetadata::new(name, symbol),
            raise_target,
            fee_schedule: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub asset_id: String,
    pub initial_buy: Option<TradeReceipt>,
}

/// Execute a launch against `market`. `seq` is the instance's launch counter.
pub fn launch(
    cfg: &SystemConfig,
    market: &mut Market,
    instance_id: &str,
    seq: u64,
    ctx: &CallContext,
    req: &LaunchRequest,
) -> EngineResult<LaunchOutcome> {
    req.metadata.validate()?;
    let fee_schedule = req.fee_schedule.unwrap_or(cfg.default_fee_schedule);
    fee_schedule.validate()?;
    if ctx.value < cfg.creation_fee {
        return Err(EngineError::InvalidParameters(format!(
            "creation fee {} required, {} attached",
            cfg.creation_fee, ctx.value
        )));
    }

    let unit = 10u128
        .checked_pow(cfg.decimals as u32)
        .ok_or_else(|| EngineError::overflow("token unit"))?;
    let asset_id = derive_id(
        ASSET_ID_PREFIX,
        &[
            instance_id.as_bytes(),
            ctx.caller.as_bytes(),
            req.metadata.symbol.as_bytes(),
            &seq.to_le_bytes(),
        ],
    );
    if market.assets.contains_key(&asset_id) {
        return Err(EngineError::InvalidParameters(format!(
            "asset {} already exists",
            asset_id
        )));
    }
    let mut curve = BondingCurve::new(&asset_id, cfg.curve, unit, cfg.supply_cap, req.raise_target)?;

    market.ledger.register_asset(&asset_id, cfg.supply_cap)?;
    market.ledger.mint_to_reserve(&asset_id, cfg.supply_cap)?;
    if cfg.creation_fee > 0 {
        market
            .ledger
            .credit(NATIVE_ASSET, &cfg.fee_recipient, cfg.creation_fee)?;
    }

    let record = AssetRecord {
        id: asset_id.clone(),
        metadata: req.metadata.clone(),
        supply_cap: cfg.supply_cap,
        decimals: cfg.decimals,
        creator: ctx.caller.clone(),
        created_at: ctx.timestamp,
        state: AssetState::Curve,
        raise_target: req.raise_target,
        fee_schedule,
        launch_seq: seq,
    };

    let surplus = ctx.value - cfg.creation_fee;
    let initial_buy = if surplus > 0 {
        let payees = FeePayees {
            protocol: &cfg.fee_recipient,
            referrer: None,
            creator: &ctx.caller,
        };
        let fill = curve.buy(&mut market.ledger, &fee_schedule, &payees, &ctx.caller, surplus, 0)?;
        Some(TradeReceipt {
            asset: asset_id.clone(),
            venue: "curve".to_string(),
            trader: ctx.caller.clone(),
            direction: Direction::Buy,
            amount_in: fill.amount_in,
            amount_out: fill.amount_out,
            fees: fill.fees,
            lp_fee: 0,
            promoted: fill.exhausted,
        })
    } else {
        None
    };

    market.assets.insert(asset_id.clone(), record);
    market.curves.insert(asset_id.clone(), curve);
    if initial_buy.as_ref().is_some_and(|r| r.promoted) {
        promote(cfg, market, &asset_id, ctx.timestamp)?;
    }

    info!(
        "launched {} ({}) by {} raising {}",
        asset_id, req.metadata.symbol, ctx.caller, req.raise_target
    );
    Ok(LaunchOutcome {
        asset_id,
        initial_buy,
    })
}

/// Seed a pool from an exhausted curve and flip the asset to `Promoted`.
/// Returns the seeded `(base_reserve, traded_reserve)`.
pub fn promote(cfg: &SystemConfig, market: &mut Market, asset: &str, now: u64) -> EngineResult<(u128, u128)> {
    if market.pools.contains_key(asset) {
        return Err(EngineError::InvalidParameters(format!(
            "{} already has a pool",
            asset
        )));
    }
    let (base, traded) = market.curve_mut(asset)?.drain_for_promotion()?;
    let pool = SwapPool::seed(asset, base, traded, cfg.pool_lp_fee_bps, now)?;
    market.asset_mut(asset)?.transition(AssetState::Promoted)?;
    market.pools.insert(asset.to_string(), pool);
    info!(
        "promoted {} to pool: base {} / traded {}",
        asset, base, traded
    );
    Ok((base, traded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpad_core::DEFAULT_CREATION_FEE;

    fn cfg() -> SystemConfig {
        let mut c = SystemConfig::with_admin("admin");
        c.fee_recipient = "treasury".to_string();
        c
    }

    #[test]
    fn test_launch_mints_cap_to_curve() {
        let cfg = cfg();
        let mut market = Market::new();
        let ctx = CallContext::new("maker", 100).with_value(DEFAULT_CREATION_FEE);
        let out = launch(&cfg, &mut market, "inst", 0, &ctx, &LaunchRequest::new("Pepe", "PEPE", 1_000)).unwrap();
        assert!(out.asset_id.starts_with(ASSET_ID_PREFIX));
        assert!(out.initial_buy.is_none());
        let curve = &market.curves[&out.asset_id];
        assert_eq!(curve.traded_reserve, cfg.supply_cap);
        assert_eq!(market.ledger.supply(&out.asset_id).unwrap().reserved, cfg.supply_cap);
        assert_eq!(market.ledger.balance_of(NATIVE_ASSET, "treasury"), DEFAULT_CREATION_FEE);
        assert_eq!(market.assets[&out.asset_id].state, AssetState::Curve);
        assert!(market.audit().is_ok());
    }

    #[test]
    fn test_launch_requires_creation_fee() {
        let cfg = cfg();
        let mut market = Market::new();
        let ctx = CallContext::new("maker", 100).with_value(DEFAULT_CREATION_FEE - 1);
        let err = launch(&cfg, &mut market, "inst", 0, &ctx, &LaunchRequest::new("Pepe", "PEPE", 1_000)).unwrap_err();
        assert_eq!(err.kind(), "InvalidParameters");
    }

    #[test]
    fn test_launch_rejects_bad_params() {
        let cfg = cfg();
        let mut market = Market::new();
        let ctx = CallContext::new("maker", 100).with_value(DEFAULT_CREATION_FEE);
        let zero = LaunchRequest::new("Pepe", "PEPE", 0);
        assert!(launch(&cfg, &mut market, "inst", 0, &ctx, &zero).is_err());
        let mut greedy = LaunchRequest::new("Pepe", "PEPE", 1_000);
        greedy.fee_schedule = Some(FeeSchedule {
            protocol_bps: 9_000,
            referrer_bps: 1_000,
            creator_bps: 1,
        });
        assert!(launch(&cfg, &mut market, "inst", 0, &ctx, &greedy).is_err());
        assert!(market.is_pristine());
    }

    #[test]
    fn test_initial_buy_to_target_promotes() {
        let cfg = cfg();
        let mut market = Market::new();
        let ctx = CallContext::new("maker", 100).with_value(DEFAULT_CREATION_FEE + 1_000);
        let out = launch(&cfg, &mut market, "inst", 0, &ctx, &LaunchRequest::new("Pepe", "PEPE", 1_000)).unwrap();
        let buy = out.initial_buy.unwrap();
        assert!(buy.promoted);
        assert_eq!(market.assets[&out.asset_id].state, AssetState::Promoted);
        let pool = &market.pools[&out.asset_id];
        // Creator buys without a referrer: 15 protocol + 5 creator
        assert_eq!(pool.base_reserve, 980);
        assert_eq!(pool.traded_reserve, cfg.supply_cap - buy.amount_out);
        assert!(market.audit().is_ok());
    }

    #[test]
    fn test_ids_differ_by_sequence() {
        let cfg = cfg();
        let mut market = Market::new();
        let ctx = CallContext::new("maker", 100).with_value(DEFAULT_CREATION_FEE);
        let req = LaunchRequest::new("Pepe", "PEPE", 1_000);
        let a = launch(&cfg, &mut market, "inst", 0, &ctx, &req).unwrap();
        let b = launch(&cfg, &mut market, "inst", 1, &ctx, &req).unwrap();
        assert_ne!(a.asset_id, b.asset_id);
        assert_eq!(market.token_list().len(), 2);
    }
}
