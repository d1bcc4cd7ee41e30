//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// These never reach callers of [`crate::evaluate`] as `Err`; they are
/// carried inside [`crate::FormulaOutcome::Error`] for diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// `prop("...")` names no column of the table
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Operand or argument of the wrong kind
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Arithmetic produced NaN or infinity
    #[error("Result is not a finite number")]
    NotFinite,

    /// A formula column reaches itself through `prop` references
    #[error("Circular reference through property {0}")]
    CircularReference(String),
}

impl FormulaError {
    pub(crate) fn parse<S: Into<String>>(position: usize, message: S) -> Self {
        FormulaError::Parse {
            position,
            message: message.into(),
        }
    }
}
