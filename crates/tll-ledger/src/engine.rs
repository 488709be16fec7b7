use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use tll_catalog::{Tool, ToolDraft, ToolPatch};
use tll_journal::{Journal, JournalConfig};
use tll_types::{BorrowerId, ToolId};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::locks::LockTable;
use crate::records::LedgerRecord;
use crate::replay::{self, RecoveryReport};
use crate::state::LedgerState;
use crate::traits::LedgerReader;
use crate::transaction::Transaction;

/// Journal file name inside the data directory.
const JOURNAL_FILE: &str = "ledger.journal";

/// The lending engine: one instance owns the catalog and the transaction
/// log and exposes every mutation as an atomic, invariant-preserving
/// operation.
///
/// All state sits behind a single `RwLock`, so a reader sees both sides of
/// a borrow or neither. Each mutation additionally runs inside a per-tool
/// critical section with bounded waiting, which serializes writers on the
/// same tool without making unrelated tools wait on each other.
///
/// Durable engines journal each mutation before applying it, with the
/// journal write kept outside the state lock. A crash between the append
/// and the apply replays to exactly the acknowledged state on reopen.
pub struct LendingEngine {
    state: RwLock<LedgerState>,
    locks: LockTable,
    journal: Option<Journal<LedgerRecord>>,
    config: LedgerConfig,
    recovery: Option<RecoveryReport>,
}

impl LendingEngine {
    /// A volatile engine with no journal, for tests and embedding.
    pub fn in_memory() -> Self {
        Self::in_memory_with(LedgerConfig::default())
    }

    /// A volatile engine with explicit lock and sync settings.
    pub fn in_memory_with(config: LedgerConfig) -> Self {
        Self::assemble(LedgerState::default(), None, config, None)
    }

    /// Open (or create) a durable engine rooted at `dir`.
    ///
    /// Replays the journal through the same transitions the live engine
    /// uses; a record those transitions refuse fails the open with
    /// [`LedgerError::Corrupt`] rather than serving doubtful state.
    pub fn open(dir: &Path, config: LedgerConfig) -> LedgerResult<Self> {
        let journal = Journal::open(
            &dir.join(JOURNAL_FILE),
            JournalConfig {
                sync_mode: config.sync_mode,
            },
        )?;
        let records = journal.recover()?;
        let (state, report) = replay::rebuild(records)?;
        info!(
            records = report.records_applied,
            tools = report.tools,
            transactions = report.transactions,
            open_loans = report.open_loans,
            path = %journal.path().display(),
            "ledger opened"
        );
        Ok(Self::assemble(state, Some(journal), config, Some(report)))
    }

    fn assemble(
        state: LedgerState,
        journal: Option<Journal<LedgerRecord>>,
        config: LedgerConfig,
        recovery: Option<RecoveryReport>,
    ) -> Self {
        Self {
            state: RwLock::new(state),
            locks: LockTable::new(),
            journal,
            config,
            recovery,
        }
    }

    /// What recovery found when this engine was opened from disk.
    pub fn recovery_report(&self) -> Option<&RecoveryReport> {
        self.recovery.as_ref()
    }

    // ---- catalog operations ----

    /// Add a tool to the catalog. The new tool starts with every unit on
    /// the shelf.
    pub fn create_tool(&self, draft: ToolDraft) -> LedgerResult<Tool> {
        let tool = {
            let mut state = self.write_state()?;
            state.catalog.prepare(draft)?
        };

        // The id is allocated but not yet visible; holding its section
        // keeps the bulk clear from slipping between append and apply.
        let _section = self.locks.acquire(tool.id, self.config.lock_timeout)?;
        self.append(&LedgerRecord::ToolCreated { tool: tool.clone() })?;
        {
            let mut state = self.write_state()?;
            state.catalog.restore(tool.clone())?;
        }

        debug!(tool_id = %tool.id, name = %tool.name, "tool created");
        Ok(tool)
    }

    /// Fetch one tool by id.
    pub fn tool(&self, id: ToolId) -> LedgerResult<Tool> {
        let state = self.read_state()?;
        Ok(state.catalog.get(id)?.clone())
    }

    /// All tools, in id order.
    pub fn list_tools(&self) -> LedgerResult<Vec<Tool>> {
        Ok(self.read_state()?.catalog.list())
    }

    /// Case-insensitive substring search over name and category.
    pub fn search_tools(&self, keyword: &str) -> LedgerResult<Vec<Tool>> {
        Ok(self.read_state()?.catalog.search(keyword))
    }

    /// Apply a partial update to a tool and return the updated record.
    ///
    /// Changing `total_quantity` is the administrative correction path:
    /// the lent-out count is preserved and availability recomputed, so no
    /// transaction is ever touched by a correction.
    pub fn update_tool(&self, id: ToolId, patch: &ToolPatch) -> LedgerResult<Tool> {
        let _section = self.locks.acquire(id, self.config.lock_timeout)?;

        // Probe the patch against a copy so nothing is journaled unless
        // the apply below is guaranteed to take it.
        {
            let state = self.read_state()?;
            let mut probe = state.catalog.get(id)?.clone();
            patch.apply_to(&mut probe)?;
        }

        self.append(&LedgerRecord::ToolUpdated {
            tool_id: id,
            patch: patch.clone(),
        })?;
        let updated = {
            let mut state = self.write_state()?;
            state.catalog.update(id, patch)?
        };

        debug!(tool_id = %id, "tool updated");
        Ok(updated)
    }

    /// Remove a tool from the catalog.
    ///
    /// Refused while any open loan references the tool. Closed history
    /// never blocks deletion and survives it: transactions outlive the
    /// tools they lent.
    pub fn delete_tool(&self, id: ToolId) -> LedgerResult<()> {
        let _section = self.locks.acquire(id, self.config.lock_timeout)?;

        {
            let state = self.read_state()?;
            state.catalog.get(id)?;
            let open_loans = state.log.open_count_for_tool(id);
            if open_loans > 0 {
                return Err(LedgerError::OpenLoansExist {
                    tool_id: id,
                    open_loans,
                });
            }
        }

        self.append(&LedgerRecord::ToolDeleted { tool_id: id })?;
        {
            let mut state = self.write_state()?;
            state.catalog.delete(id)?;
        }

        debug!(tool_id = %id, "tool deleted");
        Ok(())
    }

    // ---- lending operations ----

    /// Check one unit of a tool out to a borrower.
    ///
    /// Checks run in a fixed order: unknown tool, then empty shelf, then a
    /// loan this borrower already holds. On success the availability
    /// decrement and the new open transaction become visible together.
    pub fn borrow(&self, tool_id: ToolId, borrower: &BorrowerId) -> LedgerResult<Transaction> {
        let _section = self.locks.acquire(tool_id, self.config.lock_timeout)?;

        let transaction = {
            let mut state = self.write_state()?;
            let tool = state.catalog.get(tool_id)?;
            if tool.available_quantity == 0 {
                return Err(LedgerError::Unavailable(tool_id));
            }
            if state.log.open_loan(tool_id, borrower).is_some() {
                return Err(LedgerError::AlreadyBorrowed {
                    tool_id,
                    borrower: borrower.clone(),
                });
            }
            Transaction {
                id: state.log.allocate_id(),
                tool_id,
                borrower: borrower.clone(),
                borrowed_at: Utc::now(),
                returned_at: None,
            }
        };

        self.append(&LedgerRecord::Borrowed {
            transaction: transaction.clone(),
        })?;
        {
            let mut state = self.write_state()?;
            state.catalog.adjust_available(tool_id, -1)?;
            state.log.insert_open(transaction.clone())?;
        }

        debug!(
            tool_id = %tool_id,
            borrower = %transaction.borrower,
            transaction = %transaction.id,
            "borrowed"
        );
        Ok(transaction)
    }

    /// Check a borrowed unit back in.
    ///
    /// The open transaction for the (tool, borrower) pair is closed and
    /// the unit goes back on the shelf as one visible step. A return that
    /// would push availability past the total is refused; only corrupted
    /// state can get there, and refusing keeps it from spreading.
    pub fn return_tool(
        &self,
        tool_id: ToolId,
        borrower: &BorrowerId,
    ) -> LedgerResult<Transaction> {
        let _section = self.locks.acquire(tool_id, self.config.lock_timeout)?;

        let (transaction_id, returned_at) = {
            let state = self.read_state()?;
            let transaction_id =
                state
                    .log
                    .open_loan(tool_id, borrower)
                    .ok_or_else(|| LedgerError::NoActiveLoan {
                        tool_id,
                        borrower: borrower.clone(),
                    })?;
            let tool = state.catalog.get(tool_id)?;
            if tool.available_quantity >= tool.total_quantity {
                warn!(
                    tool_id = %tool_id,
                    available = tool.available_quantity,
                    total = tool.total_quantity,
                    "return would exceed total quantity; refusing"
                );
                return Err(LedgerError::OverReturn {
                    tool_id,
                    total: tool.total_quantity,
                });
            }
            (transaction_id, Utc::now())
        };

        self.append(&LedgerRecord::Returned {
            transaction_id,
            returned_at,
        })?;
        let transaction = {
            let mut state = self.write_state()?;
            let closed = state.log.close(transaction_id, returned_at)?;
            state.catalog.adjust_available(tool_id, 1)?;
            closed
        };

        debug!(
            tool_id = %tool_id,
            borrower = %transaction.borrower,
            transaction = %transaction.id,
            "returned"
        );
        Ok(transaction)
    }

    // ---- queries ----

    /// Full lending history of a tool, oldest borrow first. Each call
    /// takes a fresh consistent snapshot; later mutations never reach a
    /// result already handed out.
    pub fn history(&self, tool_id: ToolId) -> LedgerResult<Vec<Transaction>> {
        Ok(self.read_state()?.log.history_for_tool(tool_id))
    }

    /// Open loans held by a borrower, oldest first.
    pub fn outstanding(&self, borrower: &BorrowerId) -> LedgerResult<Vec<Transaction>> {
        Ok(self.read_state()?.log.open_for_borrower(borrower))
    }

    /// Total number of recorded transactions, open and closed.
    pub fn transaction_count(&self) -> LedgerResult<usize> {
        Ok(self.read_state()?.log.len())
    }

    /// Number of loans currently open across all tools.
    pub fn open_count(&self) -> LedgerResult<usize> {
        Ok(self.read_state()?.log.open_len())
    }

    // ---- administration ----

    /// Reset the ledger: drop every tool and transaction and truncate the
    /// journal down to a single marker record.
    ///
    /// Both id counters survive the wipe, in memory and across reopen, so
    /// an id handed out before a clear is never reissued after it. This
    /// also covers a create that allocated its id before the freeze and
    /// lands after it: the late tool appears in the cleared ledger under
    /// its original id instead of colliding with a fresh one.
    ///
    /// Waits for in-flight operations to drain and keeps new ones out
    /// while it runs; fails `Busy` if the ledger does not quiesce within
    /// the lock timeout.
    pub fn clear_all(&self) -> LedgerResult<()> {
        let _frozen = self.locks.freeze(self.config.lock_timeout)?;

        let marker = {
            let state = self.read_state()?;
            LedgerRecord::Cleared {
                next_tool_id: state.catalog.next_id(),
                next_transaction_id: state.log.next_id(),
            }
        };
        if let Some(journal) = &self.journal {
            journal.truncate()?;
            journal.append(&marker)?;
        }
        {
            let mut state = self.write_state()?;
            state.catalog.clear();
            state.log.clear();
        }

        info!("ledger cleared");
        Ok(())
    }

    // ---- internals ----

    fn read_state(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write_state(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Journal a record if this engine is durable. Called with the tool's
    /// critical section held but never with the state lock held, so slow
    /// disks only stall writers of the same tool.
    fn append(&self, record: &LedgerRecord) -> LedgerResult<()> {
        if let Some(journal) = &self.journal {
            journal.append(record)?;
        }
        Ok(())
    }
}

impl LedgerReader for LendingEngine {
    fn tools(&self) -> LedgerResult<Vec<Tool>> {
        self.list_tools()
    }

    fn transactions(&self) -> LedgerResult<Vec<Transaction>> {
        Ok(self.read_state()?.log.all())
    }

    fn snapshot(&self) -> LedgerResult<(Vec<Tool>, Vec<Transaction>)> {
        let state = self.read_state()?;
        Ok((state.catalog.list(), state.log.all()))
    }
}
