//! Outbound native value transfer boundary.

use std::collections::BTreeSet;

/// Sends native value to an address outside the engine. Called at most
/// once per operation, after the operation's state has been committed.
/// An `Err` makes the engine restore its pre-operation state.
pub trait ValueTransfer {
    fn transfer_value(&mut self, to: &str, amount: u128) -> Result<(), String>;
}

/// Records every transfer; addresses added with [`RecordingTransfer::reject`]
/// refuse incoming value.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransfer {
    pub sent: Vec<(String, u128)>,
    rejecting: BTreeSet<String>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, address: &str) {
        self.rejecting.insert(address.to_string());
    }

    pub fn accept(&mut self, address: &str) {
        self.rejecting.remove(address);
    }

    /// Total value sent to `address`.
    pub fn total_to(&self, address: &str) -> u128 {
        self.sent
            .iter()
            .filter(|(to, _)| to == address)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl ValueTransfer for RecordingTransfer {
    fn transfer_value(&mut self, to: &str, amount: u128) -> Result<(), String> {
        if self.rejecting.contains(to) {
            return Err(format!("{} rejected incoming value", to));
        }
        self.sent.push((to.to_string(), amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_and_rejects() {
        let mut t = RecordingTransfer::new();
        t.transfer_value("alice", 5).unwrap();
        t.transfer_value("alice", 7).unwrap();
        t.reject("bob");
        assert!(t.transfer_value("bob", 1).is_err());
        t.accept("bob");
        t.transfer_value("bob", 1).unwrap();
        assert_eq!(t.total_to("alice"), 12);
        assert_eq!(t.sent.len(), 3);
    }
}
