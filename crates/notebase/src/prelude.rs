//! Prelude module - common imports for notebase users
//!
//! ```rust
//! use notebase::prelude::*;
//! ```

pub use crate::{
    // Column types
    Aggregation,
    // Calculation types
    CalculationOptions,
    CalculationStats,
    // Cell types
    CellValue,
    Column,
    ColumnType,
    ComputedValue,
    // Error types
    Error,
    // Formula types
    FormulaBinding,
    FormulaOptions,
    FormulaOutcome,
    // Rollup types
    RelatedTableFetcher,
    Result,
    RollupOptions,
    RollupOutcome,
    // Rows and containers
    Row,
    RowView,
    SelectOption,
    Table,
    // Extension traits
    TableCalculationExt,
    Workspace,
    WorkspaceCalculationExt,
    WorkspaceExt,
    // Entry points
    compute_rollup,
    evaluate,
    evaluate_column,
};
