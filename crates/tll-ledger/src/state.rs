use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use tll_catalog::CatalogState;
use tll_types::{BorrowerId, ToolId, TransactionId};

use crate::error::{LedgerError, LedgerResult};
use crate::transaction::Transaction;

/// The transaction log: every lending event ever recorded, keyed by id,
/// plus the index of loans currently open.
///
/// Like [`CatalogState`], this is plain state with no lock of its own; the
/// engine owns it behind the shared state lock.
#[derive(Debug)]
pub struct LogState {
    transactions: BTreeMap<TransactionId, Transaction>,
    open_loans: HashMap<(ToolId, BorrowerId), TransactionId>,
    next_id: u64,
}

impl LogState {
    /// Hand out the next transaction id.
    pub fn allocate_id(&mut self) -> TransactionId {
        let id = TransactionId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// The open loan this borrower holds on this tool, if any.
    pub fn open_loan(&self, tool_id: ToolId, borrower: &BorrowerId) -> Option<TransactionId> {
        self.open_loans.get(&(tool_id, borrower.clone())).copied()
    }

    /// Record an open transaction.
    ///
    /// Rejects closed payloads, reused ids, and a second open loan for the
    /// same (tool, borrower) pair. Advances the id counter past recorded
    /// ids so recovered logs never hand an id out twice.
    pub fn insert_open(&mut self, transaction: Transaction) -> LedgerResult<()> {
        if !transaction.is_open() {
            return Err(LedgerError::AlreadyReturned(transaction.id));
        }
        if self.transactions.contains_key(&transaction.id) {
            return Err(LedgerError::DuplicateTransaction(transaction.id));
        }
        let key = (transaction.tool_id, transaction.borrower.clone());
        if self.open_loans.contains_key(&key) {
            return Err(LedgerError::AlreadyBorrowed {
                tool_id: transaction.tool_id,
                borrower: transaction.borrower.clone(),
            });
        }

        self.next_id = self.next_id.max(transaction.id.as_u64() + 1);
        self.open_loans.insert(key, transaction.id);
        self.transactions.insert(transaction.id, transaction);
        Ok(())
    }

    /// Close an open transaction and return the closed record.
    pub fn close(
        &mut self,
        id: TransactionId,
        returned_at: DateTime<Utc>,
    ) -> LedgerResult<Transaction> {
        let transaction = self
            .transactions
            .get_mut(&id)
            .ok_or(LedgerError::TransactionNotFound(id))?;
        if !transaction.is_open() {
            return Err(LedgerError::AlreadyReturned(id));
        }

        transaction.returned_at = Some(returned_at);
        let closed = transaction.clone();
        self.open_loans
            .remove(&(closed.tool_id, closed.borrower.clone()));
        Ok(closed)
    }

    /// Full history of one tool, oldest borrow first.
    ///
    /// Covers closed loans of tools that have since been deleted; a tool
    /// id that never lent anything yields an empty history.
    pub fn history_for_tool(&self, tool_id: ToolId) -> Vec<Transaction> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|transaction| transaction.tool_id == tool_id)
            .cloned()
            .collect();
        rows.sort_by(borrow_order);
        rows
    }

    /// Open loans held by one borrower, oldest first.
    pub fn open_for_borrower(&self, borrower: &BorrowerId) -> Vec<Transaction> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|transaction| transaction.is_open() && &transaction.borrower == borrower)
            .cloned()
            .collect();
        rows.sort_by(borrow_order);
        rows
    }

    /// Number of loans currently open against one tool.
    pub fn open_count_for_tool(&self, tool_id: ToolId) -> u32 {
        self.open_loans
            .keys()
            .filter(|(id, _)| *id == tool_id)
            .count() as u32
    }

    /// Every transaction, in id order.
    pub fn all(&self) -> Vec<Transaction> {
        self.transactions.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Number of loans currently open across all tools.
    pub fn open_len(&self) -> usize {
        self.open_loans.len()
    }

    /// Drop every record. The id counter is not rewound: an id handed out
    /// before a wipe is never reissued after it.
    pub fn clear(&mut self) {
        self.transactions.clear();
        self.open_loans.clear();
    }

    /// The id the next recorded transaction will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Move the id counter to at least `next`. The counter only ever moves
    /// forward; a smaller value is ignored.
    pub fn advance_next_id(&mut self, next: u64) {
        self.next_id = self.next_id.max(next);
    }
}

impl Default for LogState {
    fn default() -> Self {
        Self {
            transactions: BTreeMap::new(),
            open_loans: HashMap::new(),
            next_id: 1,
        }
    }
}

/// Borrow time, id as the tiebreak for same-instant borrows.
fn borrow_order(a: &Transaction, b: &Transaction) -> Ordering {
    a.borrowed_at
        .cmp(&b.borrowed_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Everything the engine guards: catalog and transaction log together,
/// behind one lock, so no reader ever sees half of a borrow or return.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) catalog: CatalogState,
    pub(crate) log: LogState,
}
