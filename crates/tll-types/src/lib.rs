//! Foundation types for the Tool Lending Ledger (TLL).
//!
//! This crate provides the identifiers and enumerations used throughout the
//! TLL system. Every other TLL crate depends on `tll-types`.
//!
//! # Key Types
//!
//! - [`ToolId`] -- Stable integer identifier for a catalog entry
//! - [`TransactionId`] -- Identifier for a single lending event
//! - [`BorrowerId`] -- Opaque identity of the party checking a tool out
//! - [`Condition`] -- Physical condition grade for a tool
//! - [`ToolStatus`] -- Derived availability status (never stored)

pub mod borrower;
pub mod condition;
pub mod error;
pub mod id;

pub use borrower::BorrowerId;
pub use condition::{Condition, ToolStatus};
pub use error::TypeError;
pub use id::{ToolId, TransactionId};
