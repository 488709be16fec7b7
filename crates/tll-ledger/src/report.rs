use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tll_types::{Condition, ToolId, ToolStatus};

use crate::error::LedgerResult;
use crate::traits::LedgerReader;

/// Point-in-time inventory overview: one row per tool in id order, with
/// open-loan counts folded in from the transaction log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub rows: Vec<InventoryRow>,
    pub total_tools: usize,
    pub total_open_loans: usize,
}

/// One tool's line in the inventory overview.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub id: ToolId,
    pub name: String,
    pub category: String,
    pub condition: Condition,
    pub status: ToolStatus,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub open_loans: u32,
}

impl InventoryReport {
    /// Build the overview from one consistent snapshot.
    pub fn build<R: LedgerReader>(reader: &R) -> LedgerResult<Self> {
        let (tools, transactions) = reader.snapshot()?;

        let mut open_by_tool: HashMap<ToolId, u32> = HashMap::new();
        for transaction in &transactions {
            if transaction.is_open() {
                *open_by_tool.entry(transaction.tool_id).or_default() += 1;
            }
        }
        let total_open_loans = open_by_tool.values().map(|count| *count as usize).sum();

        let mut rows: Vec<InventoryRow> = tools
            .into_iter()
            .map(|tool| InventoryRow {
                status: tool.status(),
                open_loans: open_by_tool.get(&tool.id).copied().unwrap_or(0),
                id: tool.id,
                name: tool.name,
                category: tool.category,
                condition: tool.condition,
                total_quantity: tool.total_quantity,
                available_quantity: tool.available_quantity,
            })
            .collect();
        rows.sort_by_key(|row| row.id);

        Ok(Self {
            total_tools: rows.len(),
            total_open_loans,
            rows,
        })
    }
}
