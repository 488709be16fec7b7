use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tll_catalog::{Tool, ToolPatch};
use tll_types::{ToolId, TransactionId};

use crate::transaction::Transaction;

/// Mutation records appended to the durable journal.
///
/// Replaying these in order rebuilds the entire ledger. Creation and borrow
/// records carry their payload verbatim so recovered ids match the ids
/// handed out live; updates, deletes, and returns replay through the same
/// validated transitions the live engine uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerRecord {
    ToolCreated {
        tool: Tool,
    },
    ToolUpdated {
        tool_id: ToolId,
        patch: ToolPatch,
    },
    ToolDeleted {
        tool_id: ToolId,
    },
    Borrowed {
        transaction: Transaction,
    },
    Returned {
        transaction_id: TransactionId,
        returned_at: DateTime<Utc>,
    },
    /// Administrative wipe. Carries both id counters so ids handed out
    /// before the wipe are never reissued after it, reopen included.
    Cleared {
        next_tool_id: u64,
        next_transaction_id: u64,
    },
}

impl LedgerRecord {
    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolCreated { .. } => "tool_created",
            Self::ToolUpdated { .. } => "tool_updated",
            Self::ToolDeleted { .. } => "tool_deleted",
            Self::Borrowed { .. } => "borrowed",
            Self::Returned { .. } => "returned",
            Self::Cleared { .. } => "cleared",
        }
    }
}
