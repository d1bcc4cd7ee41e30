//! Rollup error types

use thiserror::Error;

/// Failure to load a related table
///
/// Returned by [`crate::RelatedTableFetcher`] implementations. The aggregator
/// logs it and shows the rollup as unconfigured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The table exists but could not be read
    #[error("table {table_id} is unavailable: {reason}")]
    Unavailable { table_id: String, reason: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Create an unavailable error
    pub fn unavailable<S: Into<String>, R: Into<String>>(table_id: S, reason: R) -> Self {
        FetchError::Unavailable {
            table_id: table_id.into(),
            reason: reason.into(),
        }
    }
}

/// Why a rollup column cannot be computed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnconfiguredReason {
    /// Relation, target property or aggregation not chosen yet
    #[error("relation, property and aggregation must all be set")]
    MissingSettings,

    #[error("relation column {0} not found")]
    RelationColumnNotFound(String),

    #[error("column {0} is not a relation column")]
    NotARelation(String),

    /// The relation column does not point at a table
    #[error("relation column {0} has no related table")]
    NoRelatedTable(String),

    #[error("related table {0} not found")]
    RelatedTableNotFound(String),

    #[error("related table {table_id} could not be loaded: {error}")]
    FetchFailed { table_id: String, error: FetchError },

    #[error("related table has no column named {0}")]
    TargetNotFound(String),

    /// The row links to no related rows
    #[error("no related rows")]
    NoRelatedRows,
}
