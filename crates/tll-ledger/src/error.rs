use tll_catalog::CatalogError;
use tll_journal::JournalError;
use tll_types::{BorrowerId, ToolId, TransactionId};

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Catalog lookup or validation failure, passed through unchanged.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The tool exists but has no units on the shelf.
    #[error("tool {0} has no available units")]
    Unavailable(ToolId),

    /// The borrower already holds an open loan for this tool.
    #[error("tool {tool_id} is already borrowed by {borrower}")]
    AlreadyBorrowed {
        tool_id: ToolId,
        borrower: BorrowerId,
    },

    /// No open loan matches the (tool, borrower) pair.
    #[error("no active loan of tool {tool_id} held by {borrower}")]
    NoActiveLoan {
        tool_id: ToolId,
        borrower: BorrowerId,
    },

    /// Open loans still reference the tool.
    #[error("cannot delete tool {tool_id}: {open_loans} open loan(s) reference it")]
    OpenLoansExist { tool_id: ToolId, open_loans: u32 },

    /// A return would push availability past the total owned. This can
    /// only arise from state corruption, never from caller input.
    #[error("returning tool {tool_id} would exceed its total quantity of {total}")]
    OverReturn { tool_id: ToolId, total: u32 },

    /// No transaction exists under the given id.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The transaction was already closed by an earlier return.
    #[error("transaction {0} is already returned")]
    AlreadyReturned(TransactionId),

    /// A recovery insert collided with a transaction id already present.
    #[error("transaction id already recorded: {0}")]
    DuplicateTransaction(TransactionId),

    /// Could not win the tool's critical section within the bounded wait.
    #[error("timed out waiting for exclusive access to tool {0}")]
    ToolBusy(ToolId),

    /// Could not drain in-flight operations within the bounded wait.
    #[error("timed out waiting for exclusive ledger access")]
    LedgerBusy,

    /// Journal I/O or encoding failure.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    /// The journal replayed into a state the engine would never produce.
    #[error("journal replay failed at record {index}: {reason}")]
    Corrupt { index: usize, reason: String },

    /// The state lock was poisoned by a panicking writer.
    #[error("ledger state lock poisoned")]
    LockPoisoned,
}

/// Coarse classification of a [`LedgerError`], for callers that present
/// failures rather than match on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: blank required field, unknown condition, bad id.
    Validation,
    /// Unknown tool, transaction, or loan pair.
    NotFound,
    /// The request is well-formed but would violate a ledger invariant.
    Conflict,
    /// Exclusive access could not be won within the bounded wait; the
    /// request is safe to retry.
    Busy,
    /// Durability or internal state failure.
    Storage,
}

impl LedgerError {
    /// Which caller-facing class this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) => ErrorKind::NotFound,
            Self::Catalog(CatalogError::EmptyField { .. }) => ErrorKind::Validation,
            Self::Catalog(_) => ErrorKind::Conflict,
            Self::NoActiveLoan { .. } | Self::TransactionNotFound(_) => ErrorKind::NotFound,
            Self::Unavailable(_)
            | Self::AlreadyBorrowed { .. }
            | Self::OpenLoansExist { .. }
            | Self::OverReturn { .. }
            | Self::AlreadyReturned(_)
            | Self::DuplicateTransaction(_) => ErrorKind::Conflict,
            Self::ToolBusy(_) | Self::LedgerBusy => ErrorKind::Busy,
            Self::Journal(_) | Self::Corrupt { .. } | Self::LockPoisoned => ErrorKind::Storage,
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_split_across_kinds() {
        let not_found = LedgerError::Catalog(CatalogError::NotFound(ToolId::new(3)));
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let blank = LedgerError::Catalog(CatalogError::EmptyField { field: "name" });
        assert_eq!(blank.kind(), ErrorKind::Validation);

        let below = LedgerError::Catalog(CatalogError::TotalBelowLentOut {
            id: ToolId::new(3),
            requested: 1,
            lent_out: 2,
        });
        assert_eq!(below.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn lending_conflicts_and_lookups_classify() {
        let borrower = BorrowerId::new("alice").unwrap();

        let dup = LedgerError::AlreadyBorrowed {
            tool_id: ToolId::new(1),
            borrower: borrower.clone(),
        };
        assert_eq!(dup.kind(), ErrorKind::Conflict);

        let missing = LedgerError::NoActiveLoan {
            tool_id: ToolId::new(1),
            borrower,
        };
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        assert_eq!(LedgerError::ToolBusy(ToolId::new(1)).kind(), ErrorKind::Busy);
        assert_eq!(LedgerError::LockPoisoned.kind(), ErrorKind::Storage);
    }

    #[test]
    fn transparent_catalog_display_keeps_the_inner_message() {
        let error = LedgerError::Catalog(CatalogError::NotFound(ToolId::new(5)));
        assert_eq!(error.to_string(), "tool not found: 5");
    }

    #[test]
    fn no_active_loan_names_both_sides() {
        let error = LedgerError::NoActiveLoan {
            tool_id: ToolId::new(2),
            borrower: BorrowerId::new("bob").unwrap(),
        };
        assert_eq!(error.to_string(), "no active loan of tool 2 held by bob");
    }
}
