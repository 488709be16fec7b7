use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid condition {0:?}: expected Good, Fair, or Poor")]
    InvalidCondition(String),

    #[error("borrower identifier must not be empty")]
    EmptyBorrower,
}
