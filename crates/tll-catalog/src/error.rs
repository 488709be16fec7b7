use tll_types::ToolId;

/// Errors from catalog operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No tool exists under the given id.
    #[error("tool not found: {0}")]
    NotFound(ToolId),

    /// A required text field was empty after trimming.
    #[error("validation failed: {field} must not be empty")]
    EmptyField { field: &'static str },

    /// An availability adjustment would leave the count outside
    /// `0..=total_quantity`.
    #[error(
        "quantity adjustment out of range for tool {id}: {delta:+} against {available}/{total}"
    )]
    QuantityOutOfRange {
        id: ToolId,
        available: u32,
        total: u32,
        delta: i64,
    },

    /// A total-quantity correction would drop below the units currently out.
    #[error("cannot set total quantity of tool {id} to {requested}: {lent_out} units are lent out")]
    TotalBelowLentOut {
        id: ToolId,
        requested: u32,
        lent_out: u32,
    },

    /// A recovery insert collided with an id already present.
    #[error("tool id already present: {0}")]
    DuplicateId(ToolId),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
