//! Catalog store for the Tool Lending Ledger.
//!
//! This crate holds the durable record of what tools exist: identity, display
//! fields, condition grade, and the quantity bookkeeping that lending runs on.
//! It is a leaf component -- it knows nothing about transactions or borrowers.
//! The ledger engine owns a [`CatalogState`] behind its state lock and drives
//! every mutation through the typed operations here.
//!
//! # Key Types
//!
//! - [`Tool`] -- a catalog entry with derived availability status
//! - [`ToolDraft`] -- input for creating a tool
//! - [`ToolPatch`] -- partial update where absent fields are left unchanged
//! - [`CatalogState`] -- the keyed map of tools plus the id counter
//!
//! # Design Rules
//!
//! 1. Tool ids come from a monotonic counter and are never reused.
//! 2. `available_quantity` stays within `0..=total_quantity` at all times.
//! 3. Status is never stored; it is derived from `available_quantity`.
//! 4. Changing `total_quantity` preserves the number of units lent out.
//! 5. Validation failures leave the state untouched.

pub mod error;
pub mod state;
pub mod tool;

pub use error::{CatalogError, CatalogResult};
pub use state::CatalogState;
pub use tool::{Tool, ToolDraft, ToolPatch};
