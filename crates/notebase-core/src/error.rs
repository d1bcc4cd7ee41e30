//! Error types for notebase-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notebase-core
#[derive(Debug, Error)]
pub enum Error {
    /// Table not found by id
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found by id
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Row not found by id
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// Duplicate table id in a workspace
    #[error("Table id already exists: {0}")]
    DuplicateTable(String),

    /// Duplicate column id in a table
    #[error("Column id already exists: {0}")]
    DuplicateColumn(String),

    /// Duplicate row id in a table
    #[error("Row id already exists: {0}")]
    DuplicateRow(String),

    /// Attempt to write a user value into a formula or rollup column
    #[error("Column {0} is computed and cannot be written")]
    ComputedColumn(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
