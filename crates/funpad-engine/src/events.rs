//! Engine events, appended by every committed state transition.
//!
//! The log is bounded: once it grows past [`EVENT_LOG_CAPACITY`] plus a
//! quarter, the oldest records are dropped. Sequence numbers keep counting.

use crate::Direction;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EngineEvent {
    Launched {
        asset: String,
        creator: String,
        symbol: String,
    },
    Trade {
        asset: String,
        venue: String,
        trader: String,
        direction: Direction,
        #[serde(with = "funpad_core::u128_str")]
        amount_in: u128,
        #[serde(with = "funpad_core::u128_str")]
        amount_out: u128,
    },
    Promoted {
        asset: String,
        #[serde(with = "funpad_core::u128_str")]
        base_reserve: u128,
        #[serde(with = "funpad_core::u128_str")]
        traded_reserve: u128,
    },
    Retired {
        asset: String,
    },
    Withdrawal {
        account: String,
        #[serde(with = "funpad_core::u128_str")]
        amount: u128,
    },
    PauseChanged {
        paused: bool,
        by: String,
    },
    ConfigChanged {
        field: String,
        by: String,
    },
    MigrationProposed {
        destination: String,
    },
    MigrationCancelled {
        destination: String,
    },
    MigrationExported {
        destination: String,
        checksum: String,
    },
    MigrationDeclined {
        source: String,
    },
    MigrationImported {
        source: String,
        state_root: String,
    },
    MigrationFinalized {
        destination: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: u64,
    pub event: EngineEvent,
}

/// Records retained after trimming.
pub const EVENT_LOG_CAPACITY: usize = 4_096;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_seq: u64,
}

impl EventLog {
    pub fn push(&mut self, timestamp: u64, event: EngineEvent) {
        self.records.push(EventRecord {
            seq: self.next_seq,
            timestamp,
            event,
        });
        self.next_seq += 1;
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Sequence number the next record will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Drop every record from `seq` on.
    pub fn rollback(&mut self, seq: u64) {
        let keep = self.records.partition_point(|r| r.seq < seq);
        self.records.truncate(keep);
        self.next_seq = seq.min(self.next_seq);
    }

    pub fn trim(&mut self, capacity: usize) {
        if self.records.len() > capacity + capacity / 4 {
            let excess = self.records.len() - capacity;
            self.records.drain(..excess);
        }
    }
}
