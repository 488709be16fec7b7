use std::time::Duration;

use serde::{Deserialize, Serialize};

use tll_journal::SyncMode;

/// Configuration for a [`LendingEngine`](crate::engine::LendingEngine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Longest a caller waits for a tool's critical section before the
    /// operation fails with a retryable `Busy` error. Zero means fail
    /// immediately whenever the tool is contended.
    pub lock_timeout: Duration,

    /// Flush strategy of the backing journal. Ignored by in-memory
    /// engines.
    pub sync_mode: SyncMode,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            sync_mode: SyncMode::default(),
        }
    }
}

impl LedgerConfig {
    /// Configuration for tests and tooling that should never stall:
    /// contention fails fast and the journal skips per-write fsync.
    pub fn impatient() -> Self {
        Self {
            lock_timeout: Duration::from_millis(50),
            sync_mode: SyncMode::OsDefault,
        }
    }
}
