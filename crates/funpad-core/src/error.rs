//! Error taxonomy shared by every engine component.
//!
//! Every public operation is all-or-nothing: when one of these errors is
//! returned, no state mutation from that operation is observable.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InsufficientBalance {
        asset: String,
        account: String,
        have: u128,
        need: u128,
    },
    ArithmeticOverflow(String),
    SlippageExceeded {
        min_out: u128,
        actual: u128,
    },
    CurveExhausted(String),
    InsufficientReserve {
        available: u128,
        requested: u128,
    },
    InsufficientLiquidity {
        reserve_out: u128,
        amount_out: u128,
    },
    AssetRetired(String),
    SystemPaused,
    InvalidParameters(String),
    NotAdmin(String),
    MigrationInProgress,
    TransferFailed {
        to: String,
        amount: u128,
        reason: String,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Stable kind name, independent of the context payload.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InsufficientBalance { .. } => "InsufficientBalance",
            EngineError::ArithmeticOverflow(_) => "ArithmeticOverflow",
            EngineError::SlippageExceeded { .. } => "SlippageExceeded",
            EngineError::CurveExhausted(_) => "CurveExhausted",
            EngineError::InsufficientReserve { .. } => "InsufficientReserve",
            EngineError::InsufficientLiquidity { .. } => "InsufficientLiquidity",
            EngineError::AssetRetired(_) => "AssetRetired",
            EngineError::SystemPaused => "SystemPaused",
            EngineError::InvalidParameters(_) => "InvalidParameters",
            EngineError::NotAdmin(_) => "NotAdmin",
            EngineError::MigrationInProgress => "MigrationInProgress",
            EngineError::TransferFailed { .. } => "TransferFailed",
        }
    }

    pub fn overflow(ctx: &str) -> Self {
        EngineError::ArithmeticOverflow(ctx.to_string())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EngineError::InsufficientBalance {
                asset,
                account,
                have,
                need,
            } => write!(
                f,
                "Insufficient balance: {} holds {} of {}, needs {}",
                account, have, asset, need
            ),
            EngineError::ArithmeticOverflow(ctx) => write!(f, "Arithmetic overflow: {}", ctx),
            EngineError::SlippageExceeded { min_out, actual } => write!(
                f,
                "Slippage exceeded: output {} below minimum {}",
                actual, min_out
            ),
            EngineError::CurveExhausted(asset) => {
                write!(f, "Bonding curve exhausted for {}", asset)
            }
            EngineError::InsufficientReserve {
                available,
                requested,
            } => write!(
                f,
                "Insufficient reserve: requested {} but only {} raised",
                requested, available
            ),
            EngineError::InsufficientLiquidity {
                reserve_out,
                amount_out,
            } => write!(
                f,
                "Insufficient liquidity: output {} would drain reserve {}",
                amount_out, reserve_out
            ),
            EngineError::AssetRetired(asset) => write!(f, "Asset {} is retired", asset),
            EngineError::SystemPaused => write!(f, "System is paused"),
            EngineError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            EngineError::NotAdmin(who) => write!(f, "{} is not an admin", who),
            EngineError::MigrationInProgress => {
                write!(f, "Instance is frozen by a migration")
            }
            EngineError::TransferFailed { to, amount, reason } => write!(
                f,
                "Value transfer of {} to {} failed: {}",
                amount, to, reason
            ),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        let e = EngineError::SlippageExceeded {
            min_out: 10,
            actual: 9,
        };
        assert_eq!(e.kind(), "SlippageExceeded");
        assert_eq!(EngineError::SystemPaused.kind(), "SystemPaused");
    }

    #[test]
    fn test_display_carries_context() {
        let e = EngineError::InsufficientBalance {
            asset: "FUNa1".into(),
            account: "alice".into(),
            have: 5,
            need: 7,
        };
        let msg = e.to_string();
        assert!(msg.contains("alice"));
        assert!(msg.contains("needs 7"));
    }
}
