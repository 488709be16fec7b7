use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use tll_types::ToolId;

use crate::error::{LedgerError, LedgerResult};

/// Per-tool critical sections with bounded waiting.
///
/// At most one holder per tool id; operations on different tools never
/// wait on each other. A waiter that cannot enter before its deadline gets
/// a retryable `Busy` error instead of queueing forever. The whole table
/// can be frozen, which drains in-flight holders and refuses new entries
/// until thawed; the bulk clear uses this to get the ledger to itself.
#[derive(Debug)]
pub(crate) struct LockTable {
    inner: Mutex<TableState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct TableState {
    held: HashSet<ToolId>,
    frozen: bool,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(TableState::default()),
            changed: Condvar::new(),
        }
    }

    /// Enter the critical section for one tool, waiting up to `timeout`.
    pub(crate) fn acquire(&self, tool_id: ToolId, timeout: Duration) -> LedgerResult<ToolGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.lock().map_err(|_| LedgerError::LockPoisoned)?;

        while state.frozen || state.held.contains(&tool_id) {
            let now = Instant::now();
            if now >= deadline {
                return Err(LedgerError::ToolBusy(tool_id));
            }
            let (next, wait) = self
                .changed
                .wait_timeout(state, deadline - now)
                .map_err(|_| LedgerError::LockPoisoned)?;
            state = next;
            if wait.timed_out() && (state.frozen || state.held.contains(&tool_id)) {
                return Err(LedgerError::ToolBusy(tool_id));
            }
        }

        state.held.insert(tool_id);
        Ok(ToolGuard {
            table: self,
            tool_id,
        })
    }

    /// Stop granting sections and wait for in-flight holders to drain.
    ///
    /// On timeout the table is thawed again before the error returns, so a
    /// failed freeze never wedges the ledger.
    pub(crate) fn freeze(&self, timeout: Duration) -> LedgerResult<FreezeGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.lock().map_err(|_| LedgerError::LockPoisoned)?;

        while state.frozen {
            let now = Instant::now();
            if now >= deadline {
                return Err(LedgerError::LedgerBusy);
            }
            let (next, wait) = self
                .changed
                .wait_timeout(state, deadline - now)
                .map_err(|_| LedgerError::LockPoisoned)?;
            state = next;
            if wait.timed_out() && state.frozen {
                return Err(LedgerError::LedgerBusy);
            }
        }

        state.frozen = true;
        while !state.held.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                state.frozen = false;
                self.changed.notify_all();
                return Err(LedgerError::LedgerBusy);
            }
            let (next, wait) = self
                .changed
                .wait_timeout(state, deadline - now)
                .map_err(|_| LedgerError::LockPoisoned)?;
            state = next;
            if wait.timed_out() && !state.held.is_empty() {
                state.frozen = false;
                self.changed.notify_all();
                return Err(LedgerError::LedgerBusy);
            }
        }

        Ok(FreezeGuard { table: self })
    }
}

/// Exclusive hold on one tool's critical section. Released on drop.
#[derive(Debug)]
pub(crate) struct ToolGuard<'a> {
    table: &'a LockTable,
    tool_id: ToolId,
}

impl Drop for ToolGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.table.inner.lock() {
            state.held.remove(&self.tool_id);
            self.table.changed.notify_all();
        }
    }
}

/// Exclusive hold on the whole table. Thawed on drop.
#[derive(Debug)]
pub(crate) struct FreezeGuard<'a> {
    table: &'a LockTable,
}

impl Drop for FreezeGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.table.inner.lock() {
            state.frozen = false;
            self.table.changed.notify_all();
        }
    }
}
