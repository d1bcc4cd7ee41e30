//! # notebase-core
//!
//! Core data structures for notebase database tables.
//!
//! This crate provides the fundamental types shared by the formula evaluator,
//! the rollup aggregator and the table renderer:
//! - [`CellValue`] - The raw value stored in a cell (null, boolean, number, text, list, timestamp)
//! - [`Column`], [`ColumnType`], [`ColumnOptions`] - Typed column definitions
//! - [`Row`], [`RowView`] - Row storage and read access
//! - [`Table`], [`Workspace`] - The containers the engine reads from
//! - [`coerce`] - The one place where cell values are converted to numbers and display text
//!
//! ## Example
//!
//! ```rust
//! use notebase_core::{CellValue, Column, ColumnType, Row, Table};
//!
//! let mut table = Table::new("tasks", "Tasks");
//! table.add_column(Column::new("c1", "Name", ColumnType::Text)).unwrap();
//! table.add_column(Column::new("c2", "Estimate", ColumnType::Number)).unwrap();
//!
//! table
//!     .add_row(Row::new("r1").with_cell("c1", "Write docs").with_cell("c2", 3.0))
//!     .unwrap();
//!
//! let row = table.row("r1").unwrap();
//! assert_eq!(row.get("c2"), Some(&CellValue::Number(3.0)));
//! ```

pub mod cell;
pub mod coerce;
pub mod column;
pub mod error;
pub mod row;
pub mod table;
pub mod workspace;

// Re-exports for convenience
pub use cell::CellValue;
pub use column::{
    Aggregation, Column, ColumnOptions, ColumnType, FormulaOptions, RelationOptions,
    RollupOptions, SelectOption,
};
pub use error::{Error, Result};
pub use row::{Row, RowOverlay, RowView};
pub use table::{ColumnRef, Table};
pub use workspace::Workspace;

/// Display value of a formula or rollup that failed to evaluate
pub const ERROR_DISPLAY: &str = "Error";

/// Display value of a rollup column that is missing part of its configuration
pub const ROLLUP_UNCONFIGURED_DISPLAY: &str = "Configure rollup";

/// Display value of a formula column without a formula
pub const FORMULA_UNCONFIGURED_DISPLAY: &str = "Click to configure";
