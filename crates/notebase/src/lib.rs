//! # notebase
//!
//! Formula and rollup columns for Notion-style database tables.
//!
//! Notebase computes the derived cells of a table: formula columns evaluate a
//! small expression language against the other cells of a row, and rollup
//! columns aggregate a property across the rows linked through a relation.
//!
//! ## Features
//!
//! - Parsed formulas (never executed as code) with a closed function set
//! - Rename-safe `prop("Column")` references
//! - Circular reference detection
//! - Count / sum / average / min / max / unique / show-original rollups
//! - JSON workspace loading and saving
//!
//! ## Example
//!
//! ```rust
//! use notebase::prelude::*;
//!
//! let mut table = Table::new("people", "People");
//! table.add_column(Column::new("c1", "Name", ColumnType::Text)).unwrap();
//! table.add_row(Row::new("r1").with_cell("c1", "Ada")).unwrap();
//!
//! let row = table.row("r1").unwrap();
//! let outcome = evaluate("concat(\"Hello, \", prop(\"Name\"))", row, &table.columns);
//! assert_eq!(outcome.display(), "Hello, Ada");
//! ```

pub mod calculation;
pub mod prelude;

// Re-export calculation types
pub use calculation::{
    CalculatedRow, CalculationOptions, CalculationStats, DerivedValue, LiveTables,
    TableCalculation, TableCalculationExt, WorkspaceCalculationExt,
};

// Re-export core types
pub use notebase_core::{
    coerce,
    Aggregation,
    // Cell types
    CellValue,
    // Column types
    Column,
    ColumnOptions,
    ColumnRef,
    ColumnType,
    // Error types
    Error,
    FormulaOptions,
    RelationOptions,
    Result,
    RollupOptions,
    // Rows and containers
    Row,
    RowOverlay,
    RowView,
    SelectOption,
    Table,
    Workspace,

    // Display sentinels
    ERROR_DISPLAY,
    FORMULA_UNCONFIGURED_DISPLAY,
    ROLLUP_UNCONFIGURED_DISPLAY,
};

// Re-export formula types
pub use notebase_formula::{
    evaluate, evaluate_column, evaluate_column_with, evaluate_with, parse_formula, ComputedValue,
    DependencyGraph, EvaluationContext, FormulaBinding, FormulaError, FormulaExpr, FormulaOutcome,
    FormulaResult, FormulaValue,
};

// Re-export rollup types
pub use notebase_rollup::{
    check_rollup, compute_rollup, compute_rollup_column, from_fn, FetchError, RelatedTableFetcher,
    RollupOutcome, UnconfiguredReason,
};

use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Extension trait for Workspace to add file I/O
pub trait WorkspaceExt {
    /// Open a workspace from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workspace>;

    /// Save the workspace to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Parse a workspace from JSON text
    fn from_json(json: &str) -> Result<Workspace>;

    /// Serialize the workspace as pretty-printed JSON
    fn to_json(&self) -> Result<String>;
}

impl WorkspaceExt for Workspace {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workspace> {
        let path = path.as_ref();
        check_extension(path)?;
        let json = fs::read_to_string(path)
            .map_err(|e| Error::other(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        check_extension(path)?;
        fs::write(path, self.to_json()?)
            .map_err(|e| Error::other(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn from_json(json: &str) -> Result<Workspace> {
        let workspace: Workspace = serde_json::from_str(json)
            .map_err(|e| Error::other(format!("Invalid workspace: {}", e)))?;
        validate(&workspace)?;
        Ok(workspace)
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::other(e.to_string()))
    }
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("json") => Ok(()),
        _ => Err(Error::other(format!(
            "Unsupported file format: {}",
            path.display()
        ))),
    }
}

/// Reject duplicate ids, which deserialization does not catch
fn validate(workspace: &Workspace) -> Result<()> {
    let mut table_ids = HashSet::new();
    for table in workspace.tables() {
        if !table_ids.insert(table.id.as_str()) {
            return Err(Error::DuplicateTable(table.id.clone()));
        }

        let mut column_ids = HashSet::new();
        for column in &table.columns {
            if !column_ids.insert(column.id.as_str()) {
                return Err(Error::DuplicateColumn(column.id.clone()));
            }
        }

        let mut row_ids = HashSet::new();
        for row in &table.rows {
            if !row_ids.insert(row.id.as_str()) {
                return Err(Error::DuplicateRow(row.id.clone()));
            }
        }
    }
    Ok(())
}
