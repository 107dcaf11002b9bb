// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FUNPAD - CORE MODULE
//
// Settlement primitives shared by every venue: Ledger, FeeSchedule, asset
// records, error taxonomy and engine configuration.
// All financial arithmetic uses u128 atomic units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use sha3::{Digest, Sha3_256};

pub mod asset;
pub mod config;
pub mod error;
pub mod fees;
pub mod ledger;

pub use asset::{AssetMetadata, AssetRecord, AssetState};
pub use config::{AdminSet, CurveKind, EngineConfig, SystemConfig, DEFAULT_RAISE_TARGET};
pub use error::{EngineError, EngineResult};
pub use fees::{FeeSchedule, FeeSplit};
pub use ledger::{Ledger, SupplyRecord};

/// Asset id under which native value (attached call value) is tracked.
pub const NATIVE_ASSET: &str = "NATIVE";

/// Basis point denominator (10_000 bps = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Native atomic units per whole native coin (10^9, lamport-style precision)
pub const NATIVE_UNIT: u128 = 1_000_000_000;

/// Default decimals for launched assets
pub const DEFAULT_DECIMALS: u8 = 6;

/// Default supply cap for launched assets: 1,000,000,000 whole tokens
pub const DEFAULT_SUPPLY_CAP: u128 = 1_000_000_000 * 10u128.pow(DEFAULT_DECIMALS as u32);

/// Default creation fee: 0.0003 native coin
pub const DEFAULT_CREATION_FEE: u128 = 300_000;

/// Default pool LP fee kept inside the reserves: 30 bps = 0.3%
pub const DEFAULT_POOL_LP_FEE_BPS: u128 = 30;

/// Max pool LP fee: 1000 bps = 10%
pub const MAX_POOL_LP_FEE_BPS: u128 = 1_000;

/// Deterministic identifier: `{prefix}` + first 40 hex chars of SHA3-256 over the parts.
/// Parts are length-prefixed so ("ab","c") and ("a","bc") never collide.
pub fn derive_id(prefix: &str, parts: &[&[u8]]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(prefix.as_bytes());
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", prefix, &digest[..40])
}

/// u128 ↔ String serialization (JSON doesn't support 128-bit integers).
/// Deserialization also accepts plain integers so hand-written TOML stays readable.
pub mod u128_str {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

/// Same as [`u128_str`] for maps keyed by string.
pub mod u128_map_str {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(map: &BTreeMap<String, u128>, s: S) -> Result<S::Ok, S::Error> {
        let as_str: BTreeMap<&String, String> =
            map.iter().map(|(k, v)| (k, v.to_string())).collect();
        as_str.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, u128>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(d)?;
        raw.into_iter()
            .map(|(k, v)| {
                v.parse::<u128>()
                    .map(|n| (k, n))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
