use tll_catalog::CatalogError;

use crate::error::{LedgerError, LedgerResult};
use crate::records::LedgerRecord;
use crate::state::LedgerState;

/// What recovery found while rebuilding state from the journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records applied, in journal order.
    pub records_applied: usize,
    /// Tools in the rebuilt catalog.
    pub tools: usize,
    /// Transactions in the rebuilt log.
    pub transactions: usize,
    /// Loans still open after the rebuild.
    pub open_loans: usize,
}

/// Rebuild ledger state by folding journal records through the same
/// validated transitions the live engine uses.
///
/// A record the state machine refuses marks the whole journal corrupt:
/// the live engine could not have written it, so the file cannot be
/// trusted past that point.
pub(crate) fn rebuild(records: Vec<LedgerRecord>) -> LedgerResult<(LedgerState, RecoveryReport)> {
    let mut state = LedgerState::default();
    let records_applied = records.len();

    for (index, record) in records.into_iter().enumerate() {
        apply(&mut state, record).map_err(|error| LedgerError::Corrupt {
            index,
            reason: error.to_string(),
        })?;
    }

    let report = RecoveryReport {
        records_applied,
        tools: state.catalog.len(),
        transactions: state.log.len(),
        open_loans: state.log.open_len(),
    };
    Ok((state, report))
}

fn apply(state: &mut LedgerState, record: LedgerRecord) -> LedgerResult<()> {
    match record {
        LedgerRecord::ToolCreated { tool } => {
            if tool.available_quantity > tool.total_quantity {
                return Err(LedgerError::Catalog(CatalogError::QuantityOutOfRange {
                    id: tool.id,
                    available: tool.available_quantity,
                    total: tool.total_quantity,
                    delta: 0,
                }));
            }
            state.catalog.restore(tool)?;
        }
        LedgerRecord::ToolUpdated { tool_id, patch } => {
            state.catalog.update(tool_id, &patch)?;
        }
        LedgerRecord::ToolDeleted { tool_id } => {
            let open_loans = state.log.open_count_for_tool(tool_id);
            if open_loans > 0 {
                return Err(LedgerError::OpenLoansExist {
                    tool_id,
                    open_loans,
                });
            }
            state.catalog.delete(tool_id)?;
        }
        LedgerRecord::Borrowed { transaction } => {
            state.catalog.adjust_available(transaction.tool_id, -1)?;
            state.log.insert_open(transaction)?;
        }
        LedgerRecord::Returned {
            transaction_id,
            returned_at,
        } => {
            let closed = state.log.close(transaction_id, returned_at)?;
            state.catalog.adjust_available(closed.tool_id, 1)?;
        }
        LedgerRecord::Cleared {
            next_tool_id,
            next_transaction_id,
        } => {
            state.catalog.clear();
            state.log.clear();
            state.catalog.advance_next_id(next_tool_id);
            state.log.advance_next_id(next_transaction_id);
        }
    }
    Ok(())
}
