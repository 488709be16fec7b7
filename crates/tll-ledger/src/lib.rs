//! Lending engine for the Tool Lending Ledger (TLL).
//!
//! This crate is the heart of TLL. It owns the catalog and the immutable
//! transaction log behind a single engine instance and exposes every
//! mutation as an atomic, invariant-preserving operation.
//!
//! # Key Pieces
//!
//! - [`LendingEngine`] -- borrow/return, catalog maintenance, and queries,
//!   with per-tool critical sections and bounded waiting
//! - [`LedgerConfig`] -- lock and sync tuning
//! - [`LedgerRecord`] -- the journal's record type; replay rebuilds state
//!   through the same validated transitions the live engine uses
//! - [`LedgerReader`] -- read-only seam consumed by the auditor and the
//!   report builder
//! - [`LedgerAuditor`] -- cross-checks the catalog against the log
//! - [`InventoryReport`] -- per-tool overview with open-loan counts
//!
//! # Design Rules
//!
//! 1. Status is never stored; it is derived from availability at read
//!    time.
//! 2. Availability equals total minus open loans after every operation.
//! 3. A failed operation has no observable effect.
//! 4. Durable engines journal a mutation before applying it, and journal
//!    I/O happens outside the state lock so unrelated tools never wait on
//!    a slow disk.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
mod locks;
pub mod records;
pub mod replay;
pub mod report;
mod state;
pub mod traits;
pub mod transaction;

pub use audit::{AuditReport, LedgerAuditor, Violation, ViolationKind};
pub use config::LedgerConfig;
pub use engine::LendingEngine;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use records::LedgerRecord;
pub use replay::RecoveryReport;
pub use report::{InventoryReport, InventoryRow};
pub use traits::LedgerReader;
pub use transaction::Transaction;

pub use tll_journal::SyncMode;
