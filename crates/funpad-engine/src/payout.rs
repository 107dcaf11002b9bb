//! Fee-share distribution and outbound value transfers.

use funpad_core::{EngineResult, FeeSplit, Ledger};
use serde::{Deserialize, Serialize};

/// Accounts that receive the three fee shares of a trade.
#[derive(Debug, Clone, Copy)]
pub struct FeePayees<'a> {
    pub protocol: &'a str,
    pub referrer: Option<&'a str>,
    pub creator: &'a str,
}

impl<'a> FeePayees<'a> {
    pub fn has_referrer(&self) -> bool {
        self.referrer.is_some()
    }

    /// Move each non-zero share out of venue custody into its payee's balance.
    pub fn distribute(&self, ledger: &mut Ledger, asset: &str, split: &FeeSplit) -> EngineResult<()> {
        if split.protocol > 0 {
            ledger.release_reserve(asset, self.protocol, split.protocol)?;
        }
        if let Some(referrer) = self.referrer {
            if split.referrer > 0 {
                ledger.release_reserve(asset, referrer, split.referrer)?;
            }
        }
        if split.creator > 0 {
            ledger.release_reserve(asset, self.creator, split.creator)?;
        }
        Ok(())
    }
}

/// Native value owed to an external address, sent only after the
/// operation's state has been committed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub to: String,
    #[serde(with = "funpad_core::u128_str")]
    pub amount: u128,
}

/// Treat an empty referrer or a self-referral as no referrer.
pub fn normalize_referrer<'a>(referrer: Option<&'a str>, trader: &str) -> Option<&'a str> {
    referrer.filter(|r| !r.is_empty() && *r != trader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpad_core::NATIVE_ASSET;

    #[test]
    fn test_distribute_releases_custody() {
        let mut ledger = Ledger::new();
        ledger.mint_to_reserve(NATIVE_ASSET, 1_000).unwrap();
        let split = FeeSplit {
            protocol: 10,
            referrer: 5,
            creator: 5,
            net: 980,
        };
        let payees = FeePayees {
            protocol: "treasury",
            referrer: Some("ref"),
            creator: "maker",
        };
        payees.distribute(&mut ledger, NATIVE_ASSET, &split).unwrap();
        assert_eq!(ledger.balance_of(NATIVE_ASSET, "treasury"), 10);
        assert_eq!(ledger.balance_of(NATIVE_ASSET, "ref"), 5);
        assert_eq!(ledger.balance_of(NATIVE_ASSET, "maker"), 5);
        assert_eq!(ledger.supply(NATIVE_ASSET).unwrap().reserved, 980);
        assert!(ledger.audit_all().is_ok());
    }

    #[test]
    fn test_normalize_referrer() {
        assert_eq!(normalize_referrer(Some("bob"), "alice"), Some("bob"));
        assert_eq!(normalize_referrer(Some("alice"), "alice"), None);
        assert_eq!(normalize_referrer(Some(""), "alice"), None);
        assert_eq!(normalize_referrer(None, "alice"), None);
    }
}
