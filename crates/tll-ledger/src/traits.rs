use tll_catalog::Tool;

use crate::error::LedgerResult;
use crate::transaction::Transaction;

/// Read-only view of a ledger.
///
/// The auditor and the report builders consume this instead of the engine
/// directly, so tests can feed them hand-built states, including states a
/// correct engine would never produce.
pub trait LedgerReader: Send + Sync {
    /// Every tool in the catalog, in id order.
    fn tools(&self) -> LedgerResult<Vec<Tool>>;

    /// Every recorded transaction, in id order.
    fn transactions(&self) -> LedgerResult<Vec<Transaction>>;

    /// Both sides together. Implementations backed by a single lock
    /// override this to return one consistent cut; the default takes two
    /// reads and may observe a mutation between them.
    fn snapshot(&self) -> LedgerResult<(Vec<Tool>, Vec<Transaction>)> {
        Ok((self.tools()?, self.transactions()?))
    }
}
