use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use tll_types::{BorrowerId, ToolId, TransactionId};

use crate::error::LedgerResult;
use crate::traits::LedgerReader;

/// Invariant checker over any [`LedgerReader`].
///
/// Walks a consistent snapshot and cross-checks the catalog against the
/// transaction log. A clean report means the books balance: every tool's
/// availability equals its total minus its open loans, no pair holds two
/// open loans, and no open loan points at a missing tool.
///
/// Closed transactions may reference tools that no longer exist; deletion
/// keeps history, so that is the expected shape of a retired tool, not a
/// violation.
pub struct LedgerAuditor;

impl LedgerAuditor {
    /// Audit the ledger and report every violation found.
    pub fn verify<R: LedgerReader>(reader: &R) -> LedgerResult<AuditReport> {
        let (tools, transactions) = reader.snapshot()?;

        let mut report = AuditReport {
            tools_checked: tools.len(),
            transactions_checked: transactions.len(),
            availability_consistent: true,
            loans_unique: true,
            references_resolved: true,
            timestamps_ordered: true,
            ids_monotonic: true,
            violations: Vec::new(),
        };

        let tool_ids: HashSet<ToolId> = tools.iter().map(|tool| tool.id).collect();
        let mut open_by_tool: HashMap<ToolId, u32> = HashMap::new();
        let mut open_pairs: HashSet<(ToolId, BorrowerId)> = HashSet::new();
        let mut last_id: Option<TransactionId> = None;

        for transaction in &transactions {
            if let Some(previous) = last_id {
                if transaction.id <= previous {
                    report.ids_monotonic = false;
                    report.violations.push(Violation {
                        tool_id: Some(transaction.tool_id),
                        kind: ViolationKind::NonMonotonicIds,
                        description: format!(
                            "transaction {} listed after {}",
                            transaction.id, previous
                        ),
                    });
                }
            }
            last_id = Some(transaction.id);

            if let Some(returned_at) = transaction.returned_at {
                if returned_at < transaction.borrowed_at {
                    report.timestamps_ordered = false;
                    report.violations.push(Violation {
                        tool_id: Some(transaction.tool_id),
                        kind: ViolationKind::ReturnBeforeBorrow,
                        description: format!(
                            "transaction {} returned before it was borrowed",
                            transaction.id
                        ),
                    });
                }
            }

            if transaction.is_open() {
                *open_by_tool.entry(transaction.tool_id).or_default() += 1;

                if !open_pairs.insert((transaction.tool_id, transaction.borrower.clone())) {
                    report.loans_unique = false;
                    report.violations.push(Violation {
                        tool_id: Some(transaction.tool_id),
                        kind: ViolationKind::DuplicateOpenLoan,
                        description: format!(
                            "{} holds more than one open loan of tool {}",
                            transaction.borrower, transaction.tool_id
                        ),
                    });
                }

                if !tool_ids.contains(&transaction.tool_id) {
                    report.references_resolved = false;
                    report.violations.push(Violation {
                        tool_id: Some(transaction.tool_id),
                        kind: ViolationKind::DanglingToolReference,
                        description: format!(
                            "open transaction {} references missing tool {}",
                            transaction.id, transaction.tool_id
                        ),
                    });
                }
            }
        }

        for tool in &tools {
            if tool.available_quantity > tool.total_quantity {
                report.availability_consistent = false;
                report.violations.push(Violation {
                    tool_id: Some(tool.id),
                    kind: ViolationKind::AvailabilityOutOfBounds,
                    description: format!(
                        "tool {} has {} available of {} total",
                        tool.id, tool.available_quantity, tool.total_quantity
                    ),
                });
            }

            let open = open_by_tool.get(&tool.id).copied().unwrap_or(0);
            let expected = tool.total_quantity.checked_sub(open);
            if expected != Some(tool.available_quantity) {
                report.availability_consistent = false;
                report.violations.push(Violation {
                    tool_id: Some(tool.id),
                    kind: ViolationKind::AvailabilityMismatch,
                    description: format!(
                        "tool {} has {} available but {} total with {} open loan(s)",
                        tool.id, tool.available_quantity, tool.total_quantity, open
                    ),
                });
            }
        }

        Ok(report)
    }
}

/// Outcome of one audit pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub tools_checked: usize,
    pub transactions_checked: usize,
    /// Every tool's availability equals total minus open loans, within
    /// bounds.
    pub availability_consistent: bool,
    /// No (tool, borrower) pair holds two open loans.
    pub loans_unique: bool,
    /// Every open loan references a tool that exists.
    pub references_resolved: bool,
    /// No transaction was returned before it was borrowed.
    pub timestamps_ordered: bool,
    /// Transaction ids strictly increase in log order.
    pub ids_monotonic: bool,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// `true` when no violation was found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A single broken invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The tool involved, when one can be named.
    pub tool_id: Option<ToolId>,
    pub kind: ViolationKind,
    pub description: String,
}

/// The invariant a [`Violation`] breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// availability != total - open loans.
    AvailabilityMismatch,
    /// availability > total.
    AvailabilityOutOfBounds,
    /// Two open loans for one (tool, borrower) pair.
    DuplicateOpenLoan,
    /// An open loan references a tool the catalog does not have.
    DanglingToolReference,
    /// returned_at earlier than borrowed_at.
    ReturnBeforeBorrow,
    /// Transaction ids out of order.
    NonMonotonicIds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use tll_catalog::{Tool, ToolDraft};
    use tll_types::Condition;

    use crate::engine::LendingEngine;
    use crate::transaction::Transaction;

    /// Hand-built ledger view, including shapes a correct engine would
    /// never produce.
    struct FixtureLedger {
        tools: Vec<Tool>,
        transactions: Vec<Transaction>,
    }

    impl LedgerReader for FixtureLedger {
        fn tools(&self) -> LedgerResult<Vec<Tool>> {
            Ok(self.tools.clone())
        }

        fn transactions(&self) -> LedgerResult<Vec<Transaction>> {
            Ok(self.transactions.clone())
        }
    }

    fn tool(id: u64, total: u32, available: u32) -> Tool {
        Tool {
            id: ToolId::new(id),
            name: format!("tool-{id}"),
            category: "General".into(),
            condition: Condition::Good,
            total_quantity: total,
            available_quantity: available,
            location: String::new(),
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn transaction(id: u64, tool: u64, borrower: &str, open: bool) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            tool_id: ToolId::new(tool),
            borrower: BorrowerId::new(borrower).unwrap(),
            borrowed_at: at(10),
            returned_at: if open { None } else { Some(at(20)) },
        }
    }

    fn kinds(report: &AuditReport) -> Vec<ViolationKind> {
        report.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn a_working_engine_audits_clean() {
        let engine = LendingEngine::in_memory();
        let hammer = engine
            .create_tool(ToolDraft {
                name: "Hammer".into(),
                category: "Hand Tools".into(),
                condition: Condition::Good,
                total_quantity: 2,
                location: String::new(),
            })
            .unwrap();
        let alice = BorrowerId::new("alice").unwrap();
        engine.borrow(hammer.id, &alice).unwrap();

        let report = LedgerAuditor::verify(&engine).unwrap();
        assert!(report.is_clean(), "violations: {:?}", report.violations);
        assert_eq!(report.tools_checked, 1);
        assert_eq!(report.transactions_checked, 1);
    }

    #[test]
    fn availability_mismatch_is_flagged() {
        let fixture = FixtureLedger {
            // One open loan, but the shelf count never moved.
            tools: vec![tool(1, 2, 2)],
            transactions: vec![transaction(1, 1, "alice", true)],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        assert!(!report.availability_consistent);
        assert_eq!(kinds(&report), vec![ViolationKind::AvailabilityMismatch]);
    }

    #[test]
    fn availability_above_total_is_flagged() {
        let fixture = FixtureLedger {
            tools: vec![tool(1, 2, 3)],
            transactions: vec![],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        let found = kinds(&report);
        assert!(found.contains(&ViolationKind::AvailabilityOutOfBounds));
        assert!(found.contains(&ViolationKind::AvailabilityMismatch));
    }

    #[test]
    fn duplicate_open_pair_is_flagged() {
        let fixture = FixtureLedger {
            tools: vec![tool(1, 3, 1)],
            transactions: vec![
                transaction(1, 1, "alice", true),
                transaction(2, 1, "alice", true),
            ],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        assert!(!report.loans_unique);
        assert!(kinds(&report).contains(&ViolationKind::DuplicateOpenLoan));
    }

    #[test]
    fn open_loan_on_a_missing_tool_is_flagged() {
        let fixture = FixtureLedger {
            tools: vec![],
            transactions: vec![transaction(1, 9, "alice", true)],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        assert!(!report.references_resolved);
        assert!(kinds(&report).contains(&ViolationKind::DanglingToolReference));
    }

    #[test]
    fn closed_loan_on_a_missing_tool_is_expected_history() {
        let fixture = FixtureLedger {
            tools: vec![],
            transactions: vec![transaction(1, 9, "alice", false)],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        assert!(report.is_clean(), "violations: {:?}", report.violations);
    }

    #[test]
    fn return_before_borrow_is_flagged() {
        let mut backwards = transaction(1, 1, "alice", false);
        backwards.returned_at = Some(at(1));
        let fixture = FixtureLedger {
            tools: vec![tool(1, 1, 1)],
            transactions: vec![backwards],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        assert!(!report.timestamps_ordered);
        assert_eq!(kinds(&report), vec![ViolationKind::ReturnBeforeBorrow]);
    }

    #[test]
    fn out_of_order_ids_are_flagged() {
        let fixture = FixtureLedger {
            tools: vec![tool(1, 4, 2)],
            transactions: vec![
                transaction(2, 1, "alice", true),
                transaction(1, 1, "bob", true),
            ],
        };

        let report = LedgerAuditor::verify(&fixture).unwrap();
        assert!(!report.ids_monotonic);
        assert!(kinds(&report).contains(&ViolationKind::NonMonotonicIds));
    }
}
