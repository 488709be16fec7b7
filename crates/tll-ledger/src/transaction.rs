use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tll_types::{BorrowerId, ToolId, TransactionId};

/// One lending event: a single unit of a single tool, out to one borrower.
///
/// A transaction is created open by a successful borrow and closed exactly
/// once by the matching return. Closed transactions are never mutated again
/// and never deleted, so the set of transactions is the complete lending
/// history of the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub tool_id: ToolId,
    pub borrower: BorrowerId,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// `true` while the unit is still out.
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}
