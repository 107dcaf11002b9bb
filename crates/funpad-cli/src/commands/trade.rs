use crate::commands::common::{format_units, load_engine, now, print_payouts, save_engine};
use crate::{print_info, print_success};
use colored::*;
use funpad_core::{AssetMetadata, DEFAULT_RAISE_TARGET};
use funpad_engine::{CallContext, LaunchRequest, TradeReceipt};
use std::path::Path;

pub fn launch(
    state_dir: &Path,
    caller: &str,
    metadata: AssetMetadata,
    target: Option<u128>,
    value: u128,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = load_engine(state_dir)?;
    print_info(&format!("Launching {} ({})...", metadata.name, metadata.symbol));
    let req = LaunchRequest {
        metadata,
        raise_target: target.unwrap_or(DEFAULT_RAISE_TARGET),
        fee_schedule: None,
    };

    let ctx = CallContext::new(caller, now()).with_value(value);
    let outcome = engine.launch(&ctx, &req)?;
    save_engine(state_dir, &engine)?;

    print_success("Asset launched!");
    println!("  {}: {}", "Asset".bold(), outcome.asset_id.green());
    println!(
        "  {}: {}",
        "Raise target".bold(),
        req.raise_target.to_string().cyan()
    );
    if let Some(buy) = &outcome.initial_buy {
        print_receipt(buy, engine.config().decimals);
    }
    Ok(())
}

pub fn buy(
    state_dir: &Path,
    caller: &str,
    asset: &str,
    value: u128,
    min_out: u128,
    referrer: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = load_engine(state_dir)?;
    let ctx = CallContext::new(caller, now()).with_value(value);
    let receipt = engine.buy(&ctx, asset, min_out, referrer)?;
    save_engine(state_dir, &engine)?;

    print_success("Buy executed");
    print_receipt(&receipt, engine.config().decimals);
    Ok(())
}

pub fn sell(
    state_dir: &Path,
    caller: &str,
    asset: &str,
    amount: u128,
    min_out: u128,
    referrer: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = load_engine(state_dir)?;
    let ctx = CallContext::new(caller, now());
    let receipt = engine.sell(&ctx, asset, amount, min_out, referrer)?;
    save_engine(state_dir, &engine)?;

    print_success("Sell executed");
    print_receipt(&receipt, engine.config().decimals);
    print_payouts(&engine);
    Ok(())
}

pub fn withdraw(state_dir: &Path, caller: &str, amount: u128) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = load_engine(state_dir)?;
    engine.withdraw(&CallContext::new(caller, now()), amount)?;
    save_engine(state_dir, &engine)?;

    print_success(&format!("Withdrew {} native", amount));
    print_payouts(&engine);
    Ok(())
}

fn print_receipt(r: &TradeReceipt, decimals: u8) {
    let (paid, got) = match r.direction {
        funpad_engine::Direction::Buy => (r.amount_in.to_string(), format_units(r.amount_out, decimals)),
        funpad_engine::Direction::Sell => (format_units(r.amount_in, decimals), r.amount_out.to_string()),
    };
    println!("  {}: {}", "Venue".bold(), r.venue.yellow());
    println!("  {}: {}", "In".bold(), paid.cyan());
    println!("  {}: {}", "Out".bold(), got.green());
    println!(
        "  {}: protocol {} / referrer {} / creator {}{}",
        "Fees".bold(),
        r.fees.protocol,
        r.fees.referrer,
        r.fees.creator,
        if r.lp_fee > 0 {
            format!(" / lp {}", r.lp_fee)
        } else {
            String::new()
        }
    );
    if r.promoted {
        println!(
            "  {} {}",
            "★".yellow().bold(),
            "Raise target reached: asset promoted to pool".yellow()
        );
    }
}
