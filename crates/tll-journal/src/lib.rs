//! Append-only durability for the Tool Lending Ledger.
//!
//! This crate implements the single durable file the ledger runs on: an
//! append-only journal of typed mutation records. Records are serialized
//! with bincode, framed with a length prefix and a CRC32 checksum, and
//! replayed front-to-back on open. Entries that fail the CRC check are
//! skipped -- they represent incomplete writes from a crash.
//!
//! # Key Types
//!
//! - [`Journal`] -- the segment file, generic over the record type
//! - [`JournalConfig`] / [`SyncMode`] -- flush behavior
//! - [`JournalError`] -- I/O and encoding failures
//!
//! # Design Rules
//!
//! 1. Records are never rewritten in place; the file only grows, except for
//!    the explicit bulk-clear truncation.
//! 2. A record is durable once `append` returns under `SyncMode::EveryWrite`.
//! 3. Recovery never fails on a torn tail; it keeps what is intact.
//! 4. The journal does not interpret records; replay semantics live with
//!    the caller.

pub mod error;
pub mod journal;

pub use error::{JournalError, JournalResult};
pub use journal::{Journal, JournalConfig, SyncMode};
