use crate::commands::common::{load_engine, now, save_engine, state_path, CONFIG_FILE};
use crate::{print_info, print_success};
use colored::*;
use funpad_core::EngineConfig;
use funpad_engine::{hand_off, CallContext, Engine, InMemoryRegistry, RecordingTransfer};
use std::path::Path;

/// Create an instance from `--config`, `--admin`, or `FUNPAD_*` env vars (in that order).
pub fn init(
    state_dir: &Path,
    name: &str,
    admin: Option<&str>,
    config: Option<&Path>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if state_path(state_dir).exists() && !force {
        return Err(format!(
            "Instance already exists at {} (use --force to overwrite)",
            state_dir.display()
        )
        .into());
    }

    let cfg = match (config, admin) {
        (Some(path), _) => EngineConfig::load_from_file(path)?,
        (None, Some(admin)) => EngineConfig::new(name, admin),
        (None, None) => EngineConfig::load_from_env()?,
    };
    cfg.validate()?;

    let engine = Engine::from_config(&cfg, InMemoryRegistry::new(), RecordingTransfer::new())?;
    cfg.save_to_file(&state_dir.join(CONFIG_FILE))?;
    save_engine(state_dir, &engine)?;

    print_success(&format!("Instance '{}' initialised", cfg.instance_name));
    println!("  {}: {}", "Instance id".bold(), engine.instance_id().green());
    println!("  {}: {}", "Admins".bold(), cfg.admins.join(", "));
    println!("  {}: {}", "Fee recipient".bold(), cfg.fee_recipient);
    println!("  {}: {}", "State".bold(), state_dir.display());
    Ok(())
}

pub fn pause(state_dir: &Path, caller: &str, paused: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = load_engine(state_dir)?;
    engine.set_paused(&CallContext::new(caller, now()), paused)?;
    save_engine(state_dir, &engine)?;

    if paused {
        print_success("Trading paused");
    } else {
        print_success("Trading resumed");
    }
    Ok(())
}

pub fn retire(state_dir: &Path, caller: &str, asset: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = load_engine(state_dir)?;
    engine.retire_asset(&CallContext::new(caller, now()), asset)?;
    save_engine(state_dir, &engine)?;

    print_success(&format!("{} retired", asset));
    Ok(())
}

/// Run the full propose → export → confirm → finalize handoff between two
/// local state directories. Safe to re-run after a partial failure.
pub fn migrate(state_dir: &Path, caller: &str, to: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if state_dir == to {
        return Err("Source and destination state directories are the same".into());
    }
    let mut source = load_engine(state_dir)?;
    let mut destination = load_engine(to)?;

    print_info(&format!(
        "Migrating {} -> {}...",
        source.instance_id(),
        destination.instance_id()
    ));
    let result = hand_off(&mut source, &mut destination, caller, now());

    // Persist whatever phase each side reached, even on failure
    save_engine(to, &destination)?;
    save_engine(state_dir, &source)?;
    let ack = result?;

    print_success("Migration finalized");
    println!("  {}: {}", "Destination".bold(), ack.destination.green());
    println!("  {}: {}", "State root".bold(), ack.state_root);
    println!("  {}: {}", "Checksum".bold(), ack.checksum.dimmed());
    Ok(())
}
