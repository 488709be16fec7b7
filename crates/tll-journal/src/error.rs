use thiserror::Error;

/// Errors from journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// I/O error from the underlying segment file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded for appending.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for journal operations.
pub type JournalResult<T> = Result<T, JournalError>;
