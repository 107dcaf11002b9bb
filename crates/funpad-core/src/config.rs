use crate::error::{EngineError, EngineResult};
use crate::fees::FeeSchedule;
use crate::{
    BPS_DENOMINATOR, DEFAULT_CREATION_FEE, DEFAULT_DECIMALS, DEFAULT_POOL_LP_FEE_BPS,
    DEFAULT_SUPPLY_CAP, MAX_POOL_LP_FEE_BPS, NATIVE_UNIT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default raise target for launches that don't specify one: 69 native coins
pub const DEFAULT_RAISE_TARGET: u128 = 69 * NATIVE_UNIT;

/// Pricing strategy of a bonding curve. The math lives in `funpad-engine::curve`;
/// this is the configuration value that selects and parameterises it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum CurveKind {
    /// `price(s) = base_price * (1 + s / slope)` native units per whole token
    Linear {
        #[serde(with = "crate::u128_str")]
        base_price: u128,
        #[serde(with = "crate::u128_str")]
        slope: u128,
    },
    /// Virtual-reserve constant product: `price = vb / vt`, `vb * vt = k`
    VirtualProduct {
        #[serde(with = "crate::u128_str")]
        virtual_base: u128,
        #[serde(with = "crate::u128_str")]
        virtual_token: u128,
    },
}

impl Default for CurveKind {
    fn default() -> Self {
        CurveKind::Linear {
            base_price: 60,
            slope: 800_000_000 * 10u128.pow(DEFAULT_DECIMALS as u32),
        }
    }
}

/// Ordered set of addresses with elevated authority.
/// Mutated only through admin entry points, never by trading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AdminSet(Vec<String>);

impl AdminSet {
    pub fn new(admins: impl IntoIterator<Item = String>) -> Self {
        let mut set = AdminSet(Vec::new());
        for a in admins {
            set.insert(a);
        }
        set
    }

    pub fn contains(&self, who: &str) -> bool {
        self.0.iter().any(|a| a == who)
    }

    /// Returns false if already present.
    pub fn insert(&mut self, who: String) -> bool {
        if who.is_empty() || self.contains(&who) {
            return false;
        }
        self.0.push(who);
        true
    }

    /// Never removes the last admin.
    pub fn remove(&mut self, who: &str) -> EngineResult<()> {
        if !self.contains(who) {
            return Err(EngineError::InvalidParameters(format!(
                "{} is not in the admin set",
                who
            )));
        }
        if self.0.len() == 1 {
            return Err(EngineError::InvalidParameters(
                "cannot remove the last admin".to_string(),
            ));
        }
        self.0.retain(|a| a != who);
        Ok(())
    }

    pub fn members(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runtime system configuration. Passed explicitly into router, launch and
/// admin code; every trade reads the pause/admin state from here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemConfig {
    pub admins: AdminSet,
    pub paused: bool,
    /// Receives protocol fee shares and creation fees
    pub fee_recipient: String,
    #[serde(with = "crate::u128_str")]
    pub creation_fee: u128,
    pub default_fee_schedule: FeeSchedule,
    pub curve: CurveKind,
    /// Pool fee kept inside reserves (on top of the fee schedule)
    pub pool_lp_fee_bps: u64,
    #[serde(with = "crate::u128_str")]
    pub supply_cap: u128,
    pub decimals: u8,
}

impl SystemConfig {
    /// Minimal config: one admin who also receives protocol fees.
    pub fn with_admin(admin: &str) -> Self {
        Self {
            admins: AdminSet::new([admin.to_string()]),
            paused: false,
            fee_recipient: admin.to_string(),
            creation_fee: DEFAULT_CREATION_FEE,
            default_fee_schedule: FeeSchedule::default(),
            curve: CurveKind::default(),
            pool_lp_fee_bps: DEFAULT_POOL_LP_FEE_BPS as u64,
            supply_cap: DEFAULT_SUPPLY_CAP,
            decimals: DEFAULT_DECIMALS,
        }
    }

    pub fn is_admin(&self, who: &str) -> bool {
        self.admins.contains(who)
    }

    pub fn require_admin(&self, who: &str) -> EngineResult<()> {
        if self.is_admin(who) {
            Ok(())
        } else {
            Err(EngineError::NotAdmin(who.to_string()))
        }
    }

    pub fn require_unpaused(&self) -> EngineResult<()> {
        if self.paused {
            Err(EngineError::SystemPaused)
        } else {
            Ok(())
        }
    }
}

/// On-disk engine configuration (TOML).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    pub instance_name: String,
    pub admins: Vec<String>,
    pub fee_recipient: String,
    #[serde(with = "crate::u128_str", default = "default_creation_fee")]
    pub creation_fee: u128,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub curve: CurveKind,
    #[serde(default = "default_pool_lp_fee_bps")]
    pub pool_lp_fee_bps: u64,
    #[serde(with = "crate::u128_str", default = "default_supply_cap")]
    pub supply_cap: u128,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_creation_fee() -> u128 {
    DEFAULT_CREATION_FEE
}

fn default_pool_lp_fee_bps() -> u64 {
    DEFAULT_POOL_LP_FEE_BPS as u64
}

fn default_supply_cap() -> u128 {
    DEFAULT_SUPPLY_CAP
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

impl EngineConfig {
    /// Defaults everywhere; `admin` also receives fees.
    pub fn new(instance_name: &str, admin: &str) -> Self {
        Self {
            instance_name: instance_name.to_string(),
            admins: vec![admin.to_string()],
            fee_recipient: admin.to_string(),
            creation_fee: DEFAULT_CREATION_FEE,
            fees: FeeSchedule::default(),
            curve: CurveKind::default(),
            pool_lp_fee_bps: DEFAULT_POOL_LP_FEE_BPS as u64,
            supply_cap: DEFAULT_SUPPLY_CAP,
            decimals: DEFAULT_DECIMALS,
        }
    }

    /// Load engine config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load engine config from environment variables.
    /// `FUNPAD_ADMINS` is a comma-separated list; the first admin is the
    /// default fee recipient.
    pub fn load_from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let instance_name =
            std::env::var("FUNPAD_INSTANCE").unwrap_or_else(|_| "funpad-local".to_string());

        let admins: Vec<String> = std::env::var("FUNPAD_ADMINS")
            .map_err(|_| "FUNPAD_ADMINS not set")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let fee_recipient = match std::env::var("FUNPAD_FEE_RECIPIENT") {
            Ok(r) if !r.is_empty() => r,
            _ => admins.first().cloned().unwrap_or_default(),
        };

        let creation_fee: u128 = std::env::var("FUNPAD_CREATION_FEE")
            .unwrap_or_else(|_| DEFAULT_CREATION_FEE.to_string())
            .parse()?;

        let defaults = FeeSchedule::default();
        let fees = FeeSchedule {
            protocol_bps: env_or("FUNPAD_PROTOCOL_BPS", defaults.protocol_bps)?,
            referrer_bps: env_or("FUNPAD_REFERRER_BPS", defaults.referrer_bps)?,
            creator_bps: env_or("FUNPAD_CREATOR_BPS", defaults.creator_bps)?,
        };

        let config = Self {
            instance_name,
            admins,
            fee_recipient,
            creation_fee,
            fees,
            curve: CurveKind::default(),
            pool_lp_fee_bps: env_or("FUNPAD_POOL_LP_FEE_BPS", DEFAULT_POOL_LP_FEE_BPS as u64)?,
            supply_cap: DEFAULT_SUPPLY_CAP,
            decimals: DEFAULT_DECIMALS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save engine config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.instance_name.is_empty() {
            return Err("instance_name cannot be empty".to_string());
        }
        if self.admins.is_empty() || self.admins.iter().any(|a| a.is_empty()) {
            return Err("at least one non-empty admin is required".to_string());
        }
        if self.fee_recipient.is_empty() {
            return Err("fee_recipient cannot be empty".to_string());
        }
        self.fees.validate().map_err(|e| e.to_string())?;
        if self.pool_lp_fee_bps as u128 > MAX_POOL_LP_FEE_BPS {
            return Err(format!(
                "pool_lp_fee_bps {} exceeds max {}",
                self.pool_lp_fee_bps, MAX_POOL_LP_FEE_BPS
            ));
        }
        if self.fees.total_bps() + self.pool_lp_fee_bps as u128 > BPS_DENOMINATOR {
            return Err("fee schedule plus pool fee exceeds 100%".to_string());
        }
        if self.supply_cap == 0 {
            return Err("supply_cap must be > 0".to_string());
        }
        if self.decimals > 18 {
            return Err("decimals must be 0-18".to_string());
        }
        match self.curve {
            CurveKind::Linear { base_price, slope } if base_price == 0 || slope == 0 => {
                return Err("linear curve needs base_price > 0 and slope > 0".to_string())
            }
            CurveKind::VirtualProduct {
                virtual_base,
                virtual_token,
            } if virtual_base == 0 || virtual_token <= self.supply_cap => {
                return Err(
                    "virtual product curve needs virtual_base > 0 and virtual_token > supply_cap"
                        .to_string(),
                )
            }
            _ => {}
        }
        Ok(())
    }

    pub fn to_system_config(&self) -> SystemConfig {
        SystemConfig {
            admins: AdminSet::new(self.admins.iter().cloned()),
            paused: false,
            fee_recipient: self.fee_recipient.clone(),
            creation_fee: self.creation_fee,
            default_fee_schedule: self.fees,
            curve: self.curve,
            pool_lp_fee_bps: self.pool_lp_fee_bps,
            supply_cap: self.supply_cap,
            decimals: self.decimals,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T::Err: std::error::Error + 'static,
{
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v.parse::<T>()?),
        _ => Ok(default),
    }
}
