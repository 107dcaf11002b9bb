use crate::commands::common::{format_units, load_engine};
use crate::{print_info, Side};
use colored::*;
use funpad_core::NATIVE_ASSET;
use funpad_engine::{Direction, PRICE_SCALE};
use std::path::Path;

pub fn quote(state_dir: &Path, asset: &str, side: Side, amount: u128) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(state_dir)?;
    let direction = match side {
        Side::Buy => Direction::Buy,
        Side::Sell => Direction::Sell,
    };
    let q = engine.quote(asset, direction, amount)?;

    println!("{}", "Quote".bold().underline());
    println!("  {}: {}", "Venue".bold(), q.venue.yellow());
    println!("  {}: {}", "Amount in".bold(), amount.to_string().cyan());
    println!("  {}: {}", "Amount out".bold(), q.amount_out.to_string().green());
    println!("  {}: {}", "Fee".bold(), q.fee);
    println!(
        "  {}: {}.{:02}%",
        "Price impact".bold(),
        q.price_impact_bps / 100,
        q.price_impact_bps % 100
    );
    Ok(())
}

pub fn info(state_dir: &Path, asset: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(state_dir)?;
    let record = engine
        .asset(asset)
        .ok_or_else(|| format!("Unknown asset {}", asset))?;
    let price = engine.price(asset)?;

    println!();
    println!("{}", "Asset Info".bold().underline());
    println!();
    println!(
        "  {}: {} ({})",
        "Name".bold(),
        record.metadata.name.green(),
        record.metadata.symbol.yellow()
    );
    println!("  {}: {}", "Id".bold(), record.id);
    println!("  {}: {}", "Creator".bold(), record.creator);
    println!("  {}: {:?}", "State".bold(), record.state);
    println!(
        "  {}: {}",
        "Supply cap".bold(),
        format_units(record.supply_cap, record.decimals).cyan()
    );
    println!(
        "  {}: {} native / token",
        "Spot price".bold(),
        format_price(price).cyan()
    );
    println!(
        "  {}: {}",
        "Holders".bold(),
        engine.ledger().holders(asset).len()
    );
    if !record.metadata.description.is_empty() {
        println!("  {}: {}", "Description".bold(), record.metadata.description);
    }

    if let Some(curve) = engine.curve(asset).filter(|c| !c.exhausted) {
        println!();
        println!("  {}", "Bonding curve".bold());
        println!(
            "    {}: {} / {}",
            "Raised".dimmed(),
            curve.raised.to_string().cyan(),
            curve.raise_target
        );
        println!(
            "    {}: {}",
            "Sold".dimmed(),
            format_units(curve.supply_sold(), record.decimals)
        );
    }
    if let Some(pool) = engine.pool(asset) {
        println!();
        println!("  {}", "Swap pool".bold());
        println!("    {}: {}", "Native reserve".dimmed(), pool.base_reserve.to_string().cyan());
        println!(
            "    {}: {}",
            "Token reserve".dimmed(),
            format_units(pool.traded_reserve, record.decimals).cyan()
        );
        println!("    {}: {} bps", "LP fee".dimmed(), pool.lp_fee_bps);
    }
    Ok(())
}

pub fn balance(state_dir: &Path, account: &str, asset: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(state_dir)?;
    println!("{} {}", "Balances of".bold(), account.green());

    if let Some(id) = asset {
        let decimals = engine.asset(id).map(|r| r.decimals).unwrap_or(0);
        println!(
            "  {}: {}",
            id,
            format_units(engine.balance_of(id, account), decimals).cyan()
        );
        return Ok(());
    }

    println!(
        "  {}: {}",
        NATIVE_ASSET,
        engine.balance_of(NATIVE_ASSET, account).to_string().cyan()
    );
    for record in engine.token_list() {
        let held = engine.balance_of(&record.id, account);
        if held > 0 {
            println!(
                "  {} ({}): {}",
                record.metadata.symbol.yellow(),
                record.id.dimmed(),
                format_units(held, record.decimals).cyan()
            );
        }
    }
    Ok(())
}

pub fn tokens(state_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(state_dir)?;
    let list = engine.token_list();
    if list.is_empty() {
        print_info("No assets launched yet.");
        return Ok(());
    }

    println!("{}", "Launched assets:".bold());
    println!();
    for record in &list {
        let price = engine.price(&record.id).unwrap_or(0);
        println!(
            "  {} {} ({})",
            "•".cyan(),
            record.metadata.name.bold(),
            record.metadata.symbol.yellow()
        );
        println!("    {}: {}", "Id".dimmed(), record.id.green());
        println!("    {}: {:?}", "State".dimmed(), record.state);
        println!(
            "    {}: {}",
            "Price".dimmed(),
            format_price(price)
        );
    }
    println!();
    println!(
        "{} {} {}",
        "Total:".bold(),
        list.len().to_string().cyan(),
        "asset(s)".dimmed()
    );
    Ok(())
}

/// Spot prices are scaled by `PRICE_SCALE`.
fn format_price(price: u128) -> String {
    format!("{}.{:012}", price / PRICE_SCALE, price % PRICE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(60 * PRICE_SCALE), "60.000000000000");
        assert_eq!(format_price(PRICE_SCALE / 2), "0.500000000000");
    }
}
