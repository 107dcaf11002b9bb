// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FUNPAD - SETTLEMENT ENGINE
//
// Token launch and exchange settlement:
// - Bonding-curve launches with pluggable pricing (linear / virtual product)
// - Constant-product pools seeded on promotion
// - Router dispatching trades by asset lifecycle
// - Two-phase migration of all state to a successor instance
//
// Every public operation is all-or-nothing. State is mutated in place,
// the external value transfer (at most one per operation) happens after,
// and a failed transfer restores the pre-operation snapshot. The event log
// is kept out of the snapshot and rolled back to its pre-operation mark.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use funpad_core::{
    derive_id, AssetRecord, EngineConfig, EngineError, EngineResult, FeeSchedule, Ledger,
    SystemConfig, NATIVE_ASSET,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub mod bonding_curve;
pub mod curve;
pub mod events;
pub mod launch;
pub mod market;
pub mod migration;
pub mod payout;
pub mod registry;
pub mod router;
pub mod swap_pool;
pub mod transfer;

pub use bonding_curve::BondingCurve;
pub use curve::{PricingCurve, Rounding, PRICE_SCALE};
pub use events::{EngineEvent, EventLog, EventRecord, EVENT_LOG_CAPACITY};
pub use launch::{LaunchOutcome, LaunchRequest};
pub use market::Market;
pub use migration::{
    hand_off, MigrationAck, MigrationDecline, MigrationPackage, MigrationPhase, MigrationRecord,
    MigrationState,
};
pub use payout::Payout;
pub use registry::{AssetRegistry, InMemoryRegistry, RegistryHandle};
pub use router::{Quote, SwapRequest, TradeReceipt, Venue};
pub use swap_pool::SwapPool;
pub use transfer::{RecordingTransfer, ValueTransfer};

/// Instance id prefix
pub const INSTANCE_ID_PREFIX: &str = "FUNi";

/// Trade direction relative to the native (base) asset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// native in, launched asset out
    Buy,
    /// launched asset in, native out
    Sell,
}

/// Caller identity, attached native value and timestamp, supplied by the
/// execution environment with every call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: String,
    #[serde(with = "funpad_core::u128_str")]
    pub value: u128,
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: &str, timestamp: u64) -> Self {
        Self {
            caller: caller.to_string(),
            value: 0,
            timestamp,
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }

    fn require_no_value(&self) -> EngineResult<()> {
        if self.value != 0 {
            return Err(EngineError::InvalidParameters(
                "operation does not accept attached value".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete persisted state of one engine instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub instance_id: String,
    pub instance_name: String,
    pub config: SystemConfig,
    pub market: Market,
    pub migration: MigrationState,
    pub launch_seq: u64,
    #[serde(default)]
    pub events: EventLog,
}

impl EngineState {
    pub fn new(instance_name: &str, config: SystemConfig) -> Self {
        Self {
            instance_id: derive_id(INSTANCE_ID_PREFIX, &[instance_name.as_bytes()]),
            instance_name: instance_name.to_string(),
            config,
            market: Market::new(),
            migration: MigrationState::default(),
            launch_seq: 0,
            events: EventLog::default(),
        }
    }

    /// Trading and launches: pause first, then migration freeze.
    fn guard_trading(&self) -> EngineResult<()> {
        self.config.require_unpaused()?;
        self.migration.require_active()
    }

    /// Admin mutations: authority first, then migration freeze. Pause does not apply.
    fn guard_admin(&self, caller: &str) -> EngineResult<()> {
        if let Err(e) = self.config.require_admin(caller) {
            warn!("rejected admin call from {}", caller);
            return Err(e);
        }
        self.migration.require_active()
    }

    fn emit(&mut self, timestamp: u64, event: EngineEvent) {
        self.events.push(timestamp, event);
    }
}

/// A settlement engine instance bound to its external collaborators.
pub struct Engine<R = InMemoryRegistry, T = RecordingTransfer> {
    state: EngineState,
    registry: R,
    transfer: T,
}

impl Engine<InMemoryRegistry, RecordingTransfer> {
    /// In-memory registry and recording transfer, for local use and tests.
    pub fn in_memory(instance_name: &str, config: SystemConfig) -> Self {
        Engine::new(instance_name, config, InMemoryRegistry::new(), RecordingTransfer::new())
    }
}

impl<R: AssetRegistry, T: ValueTransfer> Engine<R, T> {
    pub fn new(instance_name: &str, config: SystemConfig, registry: R, transfer: T) -> Self {
        info!("engine instance {} created", instance_name);
        Self::from_state(EngineState::new(instance_name, config), registry, transfer)
    }

    pub fn from_config(config: &EngineConfig, registry: R, transfer: T) -> EngineResult<Self> {
        config.validate().map_err(EngineError::InvalidParameters)?;
        Ok(Self::new(
            &config.instance_name,
            config.to_system_config(),
            registry,
            transfer,
        ))
    }

    pub fn from_state(state: EngineState, registry: R, transfer: T) -> Self {
        Self {
            state,
            registry,
            transfer,
        }
    }

    pub fn into_state(self) -> EngineState {
        self.state
    }

    // ─────────────────────────────────────────────────────────────
    // TRANSACTION CORE
    // ─────────────────────────────────────────────────────────────

    /// Run `op` against the live state. On `Err` the snapshot is restored.
    /// On `Ok` the state stays committed and the optional payout is sent;
    /// if the payout is rejected the snapshot is restored and
    /// `TransferFailed` is returned.
    fn transact<O>(
        &mut self,
        op: impl FnOnce(&mut EngineState, &mut R) -> EngineResult<(O, Option<Payout>)>,
    ) -> EngineResult<O> {
        let log = std::mem::take(&mut self.state.events);
        let mark = log.next_seq();
        let snapshot = self.state.clone();
        self.state.events = log;

        let (out, payout) = match op(&mut self.state, &mut self.registry) {
            Ok(v) => v,
            Err(e) => {
                self.restore(snapshot, mark);
                return Err(e);
            }
        };
        if let Some(p) = payout {
            if let Err(reason) = self.transfer.transfer_value(&p.to, p.amount) {
                warn!("payout of {} to {} rejected: {}", p.amount, p.to, reason);
                self.restore(snapshot, mark);
                return Err(EngineError::TransferFailed {
                    to: p.to,
                    amount: p.amount,
                    reason,
                });
            }
        }
        self.state.events.trim(EVENT_LOG_CAPACITY);
        Ok(out)
    }

    fn restore(&mut self, snapshot: EngineState, mark: u64) {
        let mut log = std::mem::take(&mut self.state.events);
        log.rollback(mark);
        self.state = snapshot;
        self.state.events = log;
    }

    // ─────────────────────────────────────────────────────────────
    // LAUNCH & TRADING
    // ─────────────────────────────────────────────────────────────

    /// Launch a new asset. `ctx.value` must cover the creation fee; any
    /// surplus is spent as the creator's first buy.
    pub fn launch(&mut self, ctx: &CallContext, req: &LaunchRequest) -> EngineResult<LaunchOutcome> {
        self.transact(|state, registry| {
            state.guard_trading()?;
            let seq = state.launch_seq;
            let outcome = launch::launch(&state.config, &mut state.market, &state.instance_id, seq, ctx, req)?;
            state.launch_seq += 1;
            state.emit(
                ctx.timestamp,
                EngineEvent::Launched {
                    asset: outcome.asset_id.clone(),
                    creator: ctx.caller.clone(),
                    symbol: req.metadata.symbol.clone(),
                },
            );
            if let Some(buy) = &outcome.initial_buy {
                record_trade(state, ctx.timestamp, buy)?;
            }
            registry.create_asset_record(&outcome.asset_id, &req.metadata)?;
            Ok((outcome, None))
        })
    }

    /// Route a trade to the asset's current venue.
    pub fn swap(&mut self, ctx: &CallContext, req: &SwapRequest) -> EngineResult<TradeReceipt> {
        self.transact(|state, _| {
            state.guard_trading()?;
            let (receipt, payout) = router::route_swap(&state.config, &mut state.market, ctx, req)?;
            record_trade(state, ctx.timestamp, &receipt)?;
            Ok((receipt, payout))
        })
    }

    /// Buy with all of `ctx.value`.
    pub fn buy(
        &mut self,
        ctx: &CallContext,
        asset: &str,
        min_out: u128,
        referrer: Option<&str>,
    ) -> EngineResult<TradeReceipt> {
        let req = SwapRequest {
            asset: asset.to_string(),
            direction: Direction::Buy,
            amount: ctx.value,
            min_out,
            referrer: referrer.map(str::to_string),
        };
        self.swap(ctx, &req)
    }

    pub fn sell(
        &mut self,
        ctx: &CallContext,
        asset: &str,
        amount: u128,
        min_out: u128,
        referrer: Option<&str>,
    ) -> EngineResult<TradeReceipt> {
        let req = SwapRequest {
            asset: asset.to_string(),
            direction: Direction::Sell,
            amount,
            min_out,
            referrer: referrer.map(str::to_string),
        };
        self.swap(ctx, &req)
    }

    /// Withdraw accrued native balance (fee shares, creation fees).
    pub fn withdraw(&mut self, ctx: &CallContext, amount: u128) -> EngineResult<()> {
        self.transact(|state, _| {
            ctx.require_no_value()?;
            state.migration.require_active()?;
            if amount == 0 {
                return Err(EngineError::InvalidParameters(
                    "withdraw amount must be > 0".to_string(),
                ));
            }
            state.market.ledger.debit(NATIVE_ASSET, &ctx.caller, amount)?;
            state.emit(
                ctx.timestamp,
                EngineEvent::Withdrawal {
                    account: ctx.caller.clone(),
                    amount,
                },
            );
            info!("{} withdrew {}", ctx.caller, amount);
            Ok((
                (),
                Some(Payout {
                    to: ctx.caller.clone(),
                    amount,
                }),
            ))
        })
    }

    // ─────────────────────────────────────────────────────────────
    // ADMINISTRATION
    // ─────────────────────────────────────────────────────────────

    fn admin_op(
        &mut self,
        ctx: &CallContext,
        field: &str,
        apply: impl FnOnce(&mut EngineState) -> EngineResult<()>,
    ) -> EngineResult<()> {
        self.transact(|state, _| {
            state.guard_admin(&ctx.caller)?;
            ctx.require_no_value()?;
            apply(state)?;
            state.emit(
                ctx.timestamp,
                EngineEvent::ConfigChanged {
                    field: field.to_string(),
                    by: ctx.caller.clone(),
                },
            );
            info!("{} updated {}", ctx.caller, field);
            Ok(((), None))
        })
    }

    pub fn set_paused(&mut self, ctx: &CallContext, paused: bool) -> EngineResult<()> {
        self.transact(|state, _| {
            state.guard_admin(&ctx.caller)?;
            ctx.require_no_value()?;
            state.config.paused = paused;
            state.emit(
                ctx.timestamp,
                EngineEvent::PauseChanged {
                    paused,
                    by: ctx.caller.clone(),
                },
            );
            info!("system paused={} by {}", paused, ctx.caller);
            Ok(((), None))
        })
    }

    pub fn add_admin(&mut self, ctx: &CallContext, who: &str) -> EngineResult<()> {
        self.admin_op(ctx, "admins", |state| {
            if !state.config.admins.insert(who.to_string()) {
                return Err(EngineError::InvalidParameters(format!(
                    "{} is already an admin or empty",
                    who
                )));
            }
            Ok(())
        })
    }

    /// Never removes the last admin.
    pub fn remove_admin(&mut self, ctx: &CallContext, who: &str) -> EngineResult<()> {
        self.admin_op(ctx, "admins", |state| state.config.admins.remove(who))
    }

    /// Applies to launches made after the change; existing assets keep theirs.
    pub fn set_default_fee_schedule(&mut self, ctx: &CallContext, schedule: FeeSchedule) -> EngineResult<()> {
        self.admin_op(ctx, "default_fee_schedule", |state| {
            schedule.validate()?;
            state.config.default_fee_schedule = schedule;
            Ok(())
        })
    }

    pub fn set_fee_recipient(&mut self, ctx: &CallContext, recipient: &str) -> EngineResult<()> {
        self.admin_op(ctx, "fee_recipient", |state| {
            if recipient.is_empty() {
                return Err(EngineError::InvalidParameters(
                    "fee recipient cannot be empty".to_string(),
                ));
            }
            state.config.fee_recipient = recipient.to_string();
            Ok(())
        })
    }

    pub fn set_creation_fee(&mut self, ctx: &CallContext, fee: u128) -> EngineResult<()> {
        self.admin_op(ctx, "creation_fee", |state| {
            state.config.creation_fee = fee;
            Ok(())
        })
    }

    /// `Promoted → Retired`. The pool's reserves stay in custody.
    pub fn retire_asset(&mut self, ctx: &CallContext, asset: &str) -> EngineResult<()> {
        self.transact(|state, _| {
            state.guard_admin(&ctx.caller)?;
            ctx.require_no_value()?;
            state
                .market
                .asset_mut(asset)?
                .transition(funpad_core::AssetState::Retired)?;
            state.emit(
                ctx.timestamp,
                EngineEvent::Retired {
                    asset: asset.to_string(),
                },
            );
            info!("{} retired by {}", asset, ctx.caller);
            Ok(((), None))
        })
    }

    // ─────────────────────────────────────────────────────────────
    // MIGRATION
    // ─────────────────────────────────────────────────────────────

    pub fn propose_migration(&mut self, ctx: &CallContext, destination: &str) -> EngineResult<()> {
        self.transact(|state, _| {
            ctx.require_no_value()?;
            migration::propose(state, ctx, destination)?;
            state.emit(
                ctx.timestamp,
                EngineEvent::MigrationProposed {
                    destination: destination.to_string(),
                },
            );
            Ok(((), None))
        })
    }

    pub fn cancel_migration(&mut self, ctx: &CallContext) -> EngineResult<()> {
        self.transact(|state, _| {
            let destination = migration::cancel(state, ctx)?;
            state.emit(ctx.timestamp, EngineEvent::MigrationCancelled { destination });
            Ok(((), None))
        })
    }

    /// Source side, admin only. Once exported, only [`Self::abandon_migration`]
    /// with the destination's decline can reopen the source.
    pub fn export_migration(&mut self, ctx: &CallContext) -> EngineResult<MigrationPackage> {
        self.transact(|state, _| {
            ctx.require_no_value()?;
            let (package, first) = migration::export(state, ctx)?;
            if first {
                state.emit(
                    ctx.timestamp,
                    EngineEvent::MigrationExported {
                        destination: package.destination.clone(),
                        checksum: package.checksum.clone(),
                    },
                );
            }
            Ok((package, None))
        })
    }

    /// Source side: reopen after the destination declined the exported package.
    pub fn abandon_migration(&mut self, ctx: &CallContext, decline: &MigrationDecline) -> EngineResult<()> {
        self.transact(|state, _| {
            ctx.require_no_value()?;
            let destination = migration::abandon(state, ctx, decline)?;
            state.emit(ctx.timestamp, EngineEvent::MigrationCancelled { destination });
            Ok(((), None))
        })
    }

    /// Destination side: import `package` from `source`. Replays of an
    /// already imported pair return the stored ack without touching state.
    pub fn confirm_migration(
        &mut self,
        ctx: &CallContext,
        source: &str,
        package: &MigrationPackage,
    ) -> EngineResult<MigrationAck> {
        self.transact(|state, registry| {
            ctx.require_no_value()?;
            let (ack, applied) = migration::import(state, ctx, source, package)?;
            if applied {
                state.emit(
                    ctx.timestamp,
                    EngineEvent::MigrationImported {
                        source: source.to_string(),
                        state_root: ack.state_root.clone(),
                    },
                );
                for record in state.market.assets.values() {
                    registry.create_asset_record(&record.id, &record.metadata)?;
                }
            }
            Ok((ack, None))
        })
    }

    /// Destination side: refuse a package instead of importing it.
    pub fn decline_migration(&mut self, ctx: &CallContext, package: &MigrationPackage) -> EngineResult<MigrationDecline> {
        self.transact(|state, _| {
            ctx.require_no_value()?;
            let (decline, first) = migration::decline(state, ctx, package)?;
            if first {
                state.emit(
                    ctx.timestamp,
                    EngineEvent::MigrationDeclined {
                        source: decline.source.clone(),
                    },
                );
            }
            Ok((decline, None))
        })
    }

    /// Source side, admin only: freeze for good once the destination has
    /// acknowledged the exported package.
    pub fn finalize_migration(&mut self, ctx: &CallContext, ack: &MigrationAck) -> EngineResult<()> {
        self.transact(|state, _| {
            ctx.require_no_value()?;
            if migration::finalize(state, ctx, ack)? {
                state.emit(
                    ack.confirmed_at,
                    EngineEvent::MigrationFinalized {
                        destination: ack.destination.clone(),
                    },
                );
            }
            Ok(((), None))
        })
    }

    // ─────────────────────────────────────────────────────────────
    // QUERIES (always available, including while frozen)
    // ─────────────────────────────────────────────────────────────

    pub fn quote(&self, asset: &str, direction: Direction, amount: u128) -> EngineResult<Quote> {
        router::route_quote(&self.state.market, asset, direction, amount, false)
    }

    /// Spot price of `asset` at its current venue, scaled by [`PRICE_SCALE`].
    pub fn price(&self, asset: &str) -> EngineResult<u128> {
        match Venue::resolve(&self.state.market, asset)? {
            Venue::Curve(id) => self
                .state
                .market
                .curves
                .get(&id)
                .ok_or_else(|| EngineError::InvalidParameters(format!("no bonding curve for {}", id)))?
                .price(),
            Venue::Pool(id) | Venue::Retired(id) => {
                let unit = self.state.market.asset(&id)?.unit();
                self.state
                    .market
                    .pools
                    .get(&id)
                    .ok_or_else(|| EngineError::InvalidParameters(format!("no swap pool for {}", id)))?
                    .spot_price(unit)
            }
        }
    }

    pub fn asset(&self, id: &str) -> Option<&AssetRecord> {
        self.state.market.assets.get(id)
    }

    pub fn token_list(&self) -> Vec<&AssetRecord> {
        self.state.market.token_list()
    }

    pub fn curve(&self, id: &str) -> Option<&BondingCurve> {
        self.state.market.curves.get(id)
    }

    pub fn pool(&self, id: &str) -> Option<&SwapPool> {
        self.state.market.pools.get(id)
    }

    pub fn balance_of(&self, asset: &str, account: &str) -> u128 {
        self.state.market.ledger.balance_of(asset, account)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.market.ledger
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.state.config
    }

    pub fn instance_id(&self) -> &str {
        &self.state.instance_id
    }

    pub fn migration_phase(&self) -> MigrationPhase {
        self.state.migration.phase
    }

    /// Retained event records, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        self.state.events.records()
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }

    /// Ledger and venue/custody consistency.
    pub fn audit(&self) -> Result<(), String> {
        self.state.market.audit()
    }
}

fn record_trade(state: &mut EngineState, timestamp: u64, receipt: &TradeReceipt) -> EngineResult<()> {
    state.emit(
        timestamp,
        EngineEvent::Trade {
            asset: receipt.asset.clone(),
            venue: receipt.venue.clone(),
            trader: receipt.trader.clone(),
            direction: receipt.direction,
            amount_in: receipt.amount_in,
            amount_out: receipt.amount_out,
        },
    );
    if receipt.promoted {
        let pool = state
            .market
            .pools
            .get(&receipt.asset)
            .ok_or_else(|| EngineError::InvalidParameters(format!("no swap pool for {}", receipt.asset)))?;
        let event = EngineEvent::Promoted {
            asset: receipt.asset.clone(),
            base_reserve: pool.base_reserve,
            traded_reserve: pool.traded_reserve,
        };
        state.emit(timestamp, event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpad_core::{AssetState, DEFAULT_CREATION_FEE};

    fn engine() -> Engine {
        let mut cfg = SystemConfig::with_admin("admin");
        cfg.fee_recipient = "treasury".to_string();
        Engine::in_memory("test-instance", cfg)
    }

    fn launch(engine: &mut Engine, target: u128) -> String {
        let ctx = CallContext::new("maker", 10).with_value(DEFAULT_CREATION_FEE);
        engine
            .launch(&ctx, &LaunchRequest::new("Pepe", "PEPE", target))
            .unwrap()
            .asset_id
    }

    #[test]
    fn test_launch_registers_and_emits() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        assert!(e.registry().resolve(&id).is_some());
        assert!(matches!(e.events()[0].event, EngineEvent::Launched { .. }));
        assert_eq!(e.token_list().len(), 1);
        assert!(e.audit().is_ok());
    }

    #[test]
    fn test_failed_op_restores_state() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        let before = e.state().clone();
        let ctx = CallContext::new("alice", 11).with_value(50_000);
        assert!(e.buy(&ctx, &id, u128::MAX, None).is_err());
        assert_eq!(e.state(), &before);
    }

    #[test]
    fn test_failed_op_leaves_event_log() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        let next = e.state().events.next_seq();
        let ctx = CallContext::new("alice", 11).with_value(50_000);
        assert!(e.buy(&ctx, &id, u128::MAX, None).is_err());
        assert_eq!(e.state().events.next_seq(), next);
        e.buy(&ctx, &id, 0, None).unwrap();
        let last = e.events().last().unwrap();
        assert_eq!(last.seq, next);
        assert!(matches!(last.event, EngineEvent::Trade { .. }));
    }

    #[test]
    fn test_rejected_payout_rolls_back() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        let ctx = CallContext::new("alice", 11).with_value(50_000);
        let bought = e.buy(&ctx, &id, 0, None).unwrap().amount_out;
        let before = e.state().clone();

        e.transfer_mut().reject("alice");
        let err = e.sell(&CallContext::new("alice", 12), &id, bought, 0, None).unwrap_err();
        assert_eq!(err.kind(), "TransferFailed");
        assert_eq!(e.state(), &before);
        assert_eq!(e.balance_of(&id, "alice"), bought);

        e.transfer_mut().accept("alice");
        let receipt = e.sell(&CallContext::new("alice", 13), &id, bought, 0, None).unwrap();
        assert_eq!(e.transfer().total_to("alice"), receipt.amount_out);
    }

    #[test]
    fn test_withdraw_fee_shares() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        e.buy(&CallContext::new("alice", 11).with_value(100_000), &id, 0, None)
            .unwrap();
        let owed = e.balance_of(NATIVE_ASSET, "treasury");
        assert_eq!(owed, DEFAULT_CREATION_FEE + 1_500);
        e.withdraw(&CallContext::new("treasury", 12), owed).unwrap();
        assert_eq!(e.balance_of(NATIVE_ASSET, "treasury"), 0);
        assert_eq!(e.transfer().total_to("treasury"), owed);
        let err = e.withdraw(&CallContext::new("treasury", 13), 1).unwrap_err();
        assert_eq!(err.kind(), "InsufficientBalance");
        assert!(e.audit().is_ok());
    }

    #[test]
    fn test_admin_gate_and_pause() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        let err = e.set_paused(&CallContext::new("mallory", 1), true).unwrap_err();
        assert_eq!(err, EngineError::NotAdmin("mallory".to_string()));

        e.set_paused(&CallContext::new("admin", 2), true).unwrap();
        let err = e
            .buy(&CallContext::new("alice", 3).with_value(10), &id, 0, None)
            .unwrap_err();
        assert_eq!(err, EngineError::SystemPaused);
        // Admin actions still work while paused
        e.set_creation_fee(&CallContext::new("admin", 4), 0).unwrap();
        e.set_paused(&CallContext::new("admin", 5), false).unwrap();
        assert!(e.buy(&CallContext::new("alice", 6).with_value(10_000), &id, 0, None).is_ok());
    }

    #[test]
    fn test_admin_set_changes() {
        let mut e = engine();
        let admin = CallContext::new("admin", 1);
        assert!(e.remove_admin(&admin, "admin").is_err());
        e.add_admin(&admin, "second").unwrap();
        e.remove_admin(&CallContext::new("second", 2), "admin").unwrap();
        assert!(!e.config().is_admin("admin"));
        assert_eq!(
            e.add_admin(&admin, "third").unwrap_err(),
            EngineError::NotAdmin("admin".to_string())
        );
    }

    #[test]
    fn test_retire_requires_promotion() {
        let mut e = engine();
        let id = launch(&mut e, 1_000);
        let admin = CallContext::new("admin", 1);
        assert!(e.retire_asset(&admin, &id).is_err());
        e.buy(&CallContext::new("alice", 2).with_value(1_000), &id, 0, None)
            .unwrap();
        e.retire_asset(&admin, &id).unwrap();
        assert_eq!(e.asset(&id).unwrap().state, AssetState::Retired);
        let err = e
            .buy(&CallContext::new("alice", 3).with_value(10), &id, 0, None)
            .unwrap_err();
        assert_eq!(err, EngineError::AssetRetired(id.clone()));
        assert!(e.price(&id).is_ok());
    }

    #[test]
    fn test_fee_schedule_change_applies_to_new_launches() {
        let mut e = engine();
        let old = launch(&mut e, 1_000_000);
        e.set_default_fee_schedule(&CallContext::new("admin", 1), FeeSchedule::zero())
            .unwrap();
        let ctx = CallContext::new("maker", 2).with_value(DEFAULT_CREATION_FEE);
        let new = e
            .launch(&ctx, &LaunchRequest::new("Doge", "DOGE", 1_000_000))
            .unwrap()
            .asset_id;
        assert_eq!(e.asset(&old).unwrap().fee_schedule, FeeSchedule::default());
        assert_eq!(e.asset(&new).unwrap().fee_schedule, FeeSchedule::zero());
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut e = engine();
        let id = launch(&mut e, 1_000_000);
        e.buy(&CallContext::new("alice", 2).with_value(12_345), &id, 0, None)
            .unwrap();
        let json = serde_json::to_string(e.state()).unwrap();
        let back: EngineState = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, e.state());
    }
}
