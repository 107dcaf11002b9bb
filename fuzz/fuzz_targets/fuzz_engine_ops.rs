//! Fuzz target: random operation sequences against one engine
//!
//! Drives launches, trades, withdrawals and admin calls with arbitrary
//! arguments. Every call must return Ok/Err without panicking, a failed
//! call must leave the state untouched, and the custody audit must hold
//! after every step.
//!
//! Run: cargo +nightly fuzz run fuzz_engine_ops

#![no_main]
use arbitrary::Arbitrary;
use funpad_core::SystemConfig;
use funpad_engine::{CallContext, Engine, LaunchRequest};
use libfuzzer_sys::fuzz_target;

const ACTORS: [&str; 4] = ["admin", "alice", "bob", "carol"];

#[derive(Arbitrary, Debug)]
enum Op {
    Launch { actor: u8, target: u64, value: u64 },
    Buy { actor: u8, asset: u8, value: u64, min_out: u64, referrer: Option<u8> },
    Sell { actor: u8, asset: u8, amount: u128, min_out: u64 },
    Withdraw { actor: u8, amount: u64 },
    Pause { actor: u8, paused: bool },
    Retire { actor: u8, asset: u8 },
    /// Reject payouts to this actor for the following operations
    RejectPayouts { actor: u8, reject: bool },
}

fn actor(i: u8) -> &'static str {
    ACTORS[i as usize % ACTORS.len()]
}

fn pick(assets: &[String], i: u8) -> String {
    assets
        .get(i as usize % assets.len().max(1))
        .cloned()
        .unwrap_or_default()
}

fuzz_target!(|ops: Vec<Op>| {
    let mut engine = Engine::in_memory("fuzz", SystemConfig::with_admin("admin"));
    let mut assets: Vec<String> = Vec::new();

    // Cap sequence length (prevent timeouts on huge inputs)
    for (ts, op) in ops.into_iter().take(64).enumerate() {
        let ts = ts as u64;
        let before = engine.state().clone();
        let result = match op {
            Op::Launch { actor: a, target, value } => {
                let ctx = CallContext::new(actor(a), ts).with_value(value as u128);
                let req = LaunchRequest::new("Fuzz", "FUZZ", target as u128);
                engine.launch(&ctx, &req).map(|o| assets.push(o.asset_id))
            }
            Op::Buy { actor: a, asset, value, min_out, referrer } => {
                let ctx = CallContext::new(actor(a), ts).with_value(value as u128);
                let referrer = referrer.map(actor);
                engine
                    .buy(&ctx, &pick(&assets, asset), min_out as u128, referrer)
                    .map(|_| ())
            }
            Op::Sell { actor: a, asset, amount, min_out } => engine
                .sell(&CallContext::new(actor(a), ts), &pick(&assets, asset), amount, min_out as u128, None)
                .map(|_| ()),
            Op::Withdraw { actor: a, amount } => {
                engine.withdraw(&CallContext::new(actor(a), ts), amount as u128)
            }
            Op::Pause { actor: a, paused } => engine.set_paused(&CallContext::new(actor(a), ts), paused),
            Op::Retire { actor: a, asset } => {
                engine.retire_asset(&CallContext::new(actor(a), ts), &pick(&assets, asset))
            }
            Op::RejectPayouts { actor: a, reject } => {
                if reject {
                    engine.transfer_mut().reject(actor(a));
                } else {
                    engine.transfer_mut().accept(actor(a));
                }
                Ok(())
            }
        };
        if result.is_err() {
            assert_eq!(engine.state(), &before, "failed operation mutated state");
        }
        assert!(engine.audit().is_ok(), "audit failed: {:?}", engine.audit());
    }
});
