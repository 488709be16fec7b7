use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identifier for a tool in the catalog.
///
/// Assigned once at creation from a monotonically increasing counter and
/// never reused, even after the tool is deleted. Transactions reference
/// tools by `ToolId`, so a recycled id would silently re-attach old history
/// to a new tool.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolId(u64);

impl ToolId {
    /// Create from a raw counter value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The underlying integer.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolId({})", self.0)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToolId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidId(format!("not a tool id: {s:?}")))
    }
}

/// Identifier for a single lending event.
///
/// Monotonically assigned by the ledger; gaps are permitted (a failed
/// borrow may consume an id without producing a transaction).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create from a raw counter value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The underlying integer.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidId(format!("not a transaction id: {s:?}")))
    }
}
