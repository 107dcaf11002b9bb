//! Fee schedule and fee splitting (integer-only, basis points).

use crate::error::{EngineError, EngineResult};
use crate::BPS_DENOMINATOR;
use serde::{Deserialize, Serialize};

/// Per-asset fee rates in basis points. Sum of all components must be ≤ 10_000.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub protocol_bps: u64,
    pub referrer_bps: u64,
    pub creator_bps: u64,
}

impl Default for FeeSchedule {
    /// 1% protocol, 0.5% referrer, 0.5% creator
    fn default() -> Self {
        Self {
            protocol_bps: 100,
            referrer_bps: 50,
            creator_bps: 50,
        }
    }
}

/// Result of applying a [`FeeSchedule`] to a gross amount.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeSplit {
    #[serde(with = "crate::u128_str")]
    pub protocol: u128,
    #[serde(with = "crate::u128_str")]
    pub referrer: u128,
    #[serde(with = "crate::u128_str")]
    pub creator: u128,
    /// Amount remaining after all fee shares
    #[serde(with = "crate::u128_str")]
    pub net: u128,
}

impl FeeSplit {
    pub fn total(&self) -> u128 {
        self.protocol + self.referrer + self.creator
    }
}

impl FeeSchedule {
    pub const fn zero() -> Self {
        Self {
            protocol_bps: 0,
            referrer_bps: 0,
            creator_bps: 0,
        }
    }

    pub fn total_bps(&self) -> u128 {
        self.protocol_bps as u128 + self.referrer_bps as u128 + self.creator_bps as u128
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.total_bps() > BPS_DENOMINATOR {
            return Err(EngineError::InvalidParameters(format!(
                "fee schedule sums to {} bps (max {})",
                self.total_bps(),
                BPS_DENOMINATOR
            )));
        }
        Ok(())
    }

    /// Split `amount` into fee shares and the net remainder.
    ///
    /// Each share is floored independently. Without a referrer the referrer
    /// share is folded into the protocol share. `include_creator = false`
    /// drops the creator component entirely (pool swaps).
    pub fn split(&self, amount: u128, has_referrer: bool, include_creator: bool) -> EngineResult<FeeSplit> {
        self.validate()?;
        let (protocol_bps, referrer_bps) = if has_referrer {
            (self.protocol_bps as u128, self.referrer_bps as u128)
        } else {
            (self.protocol_bps as u128 + self.referrer_bps as u128, 0)
        };
        let creator_bps = if include_creator {
            self.creator_bps as u128
        } else {
            0
        };

        let protocol = bps_of(amount, protocol_bps)?;
        let referrer = bps_of(amount, referrer_bps)?;
        let creator = bps_of(amount, creator_bps)?;
        let net = amount
            .checked_sub(protocol + referrer + creator)
            .ok_or_else(|| EngineError::overflow("fee split exceeds amount"))?;

        Ok(FeeSplit {
            protocol,
            referrer,
            creator,
            net,
        })
    }
}

/// `amount * bps / 10_000`, floored, overflow-checked.
pub fn bps_of(amount: u128, bps: u128) -> EngineResult<u128> {
    amount
        .checked_mul(bps)
        .map(|v| v / BPS_DENOMINATOR)
        .ok_or_else(|| EngineError::overflow("fee multiplication"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_valid() {
        assert!(FeeSchedule::default().validate().is_ok());
        assert_eq!(FeeSchedule::default().total_bps(), 200);
    }

    #[test]
    fn test_over_100_percent_rejected() {
        let s = FeeSchedule {
            protocol_bps: 9_000,
            referrer_bps: 900,
            creator_bps: 101,
        };
        assert_eq!(s.validate().unwrap_err().kind(), "InvalidParameters");
    }

    #[test]
    fn test_exactly_100_percent_allowed() {
        let s = FeeSchedule {
            protocol_bps: 5_000,
            referrer_bps: 2_500,
            creator_bps: 2_500,
        };
        assert!(s.validate().is_ok());
        let split = s.split(1_000, true, true).unwrap();
        assert_eq!(split.net, 0);
        assert_eq!(split.total(), 1_000);
    }

    #[test]
    fn test_split_with_referrer() {
        let split = FeeSchedule::default().split(1_000, true, true).unwrap();
        assert_eq!(split.protocol, 10);
        assert_eq!(split.referrer, 5);
        assert_eq!(split.creator, 5);
        assert_eq!(split.net, 980);
    }

    #[test]
    fn test_split_without_referrer_folds_into_protocol() {
        let split = FeeSchedule::default().split(1_000, false, true).unwrap();
        assert_eq!(split.protocol, 15);
        assert_eq!(split.referrer, 0);
        assert_eq!(split.net, 980);
    }

    #[test]
    fn test_split_without_creator() {
        let split = FeeSchedule::default().split(1_000, true, false).unwrap();
        assert_eq!(split.creator, 0);
        assert_eq!(split.net, 985);
    }

    #[test]
    fn test_split_floors_small_amounts() {
        let split = FeeSchedule::default().split(99, true, true).unwrap();
        assert_eq!(split.total(), 0);
        assert_eq!(split.net, 99);
    }

    #[test]
    fn test_split_overflow_is_error() {
        let err = FeeSchedule::default()
            .split(u128::MAX, true, true)
            .unwrap_err();
        assert_eq!(err.kind(), "ArithmeticOverflow");
    }
}
