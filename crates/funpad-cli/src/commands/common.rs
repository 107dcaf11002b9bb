use colored::*;
use funpad_engine::{AssetRegistry, Engine, EngineState, InMemoryRegistry, RecordingTransfer};
use std::path::{Path, PathBuf};

/// Engine state snapshot, rewritten after every successful command
pub const STATE_FILE: &str = "state.json";
/// Copy of the config the instance was created from
pub const CONFIG_FILE: &str = "funpad.toml";

pub type LocalEngine = Engine<InMemoryRegistry, RecordingTransfer>;

pub fn state_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE)
}

/// Load the instance in `state_dir`. The registry is rebuilt from the
/// persisted asset records in launch order.
pub fn load_engine(state_dir: &Path) -> Result<LocalEngine, Box<dyn std::error::Error>> {
    let path = state_path(state_dir);
    if !path.exists() {
        return Err(format!(
            "No instance at {} (run `funpad init` first)",
            state_dir.display()
        )
        .into());
    }
    let data = std::fs::read_to_string(&path)?;
    let state: EngineState = serde_json::from_str(&data)
        .map_err(|e| format!("Corrupt state file {}: {}", path.display(), e))?;

    let mut registry = InMemoryRegistry::new();
    for record in state.market.token_list() {
        registry.create_asset_record(&record.id, &record.metadata)?;
    }
    Ok(Engine::from_state(state, registry, RecordingTransfer::new()))
}

/// Write via a temp file so a crash never leaves a half-written state.
pub fn save_engine(state_dir: &Path, engine: &LocalEngine) -> Result<(), Box<dyn std::error::Error>> {
    let path = state_path(state_dir);
    let tmp = state_dir.join(format!("{}.tmp", STATE_FILE));
    let json = serde_json::to_string_pretty(engine.state())?;
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

pub fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `1234567` with 6 decimals → `1.234567`
pub fn format_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let unit = 10u128.pow(decimals as u32);
    format!(
        "{}.{:0width$}",
        amount / unit,
        amount % unit,
        width = decimals as usize
    )
}

/// Print the native payouts the last command sent out.
pub fn print_payouts(engine: &LocalEngine) {
    for (to, amount) in &engine.transfer().sent {
        println!(
            "  {} {} {} {}",
            "→".green(),
            amount.to_string().cyan(),
            "native paid to".dimmed(),
            to
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpad_core::SystemConfig;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_234_567, 6), "1.234567");
        assert_eq!(format_units(5, 6), "0.000005");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::in_memory("cli-test", SystemConfig::with_admin("root"));
        save_engine(dir.path(), &engine).unwrap();
        let back = load_engine(dir.path()).unwrap();
        assert_eq!(back.state(), engine.state());
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_instance() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_engine(dir.path()).err().unwrap();
        assert!(err.to_string().contains("funpad init"));
    }
}
