//! Row types

use crate::cell::CellValue;
use std::collections::HashMap;

static NULL_VALUE: CellValue = CellValue::Null;

/// Read access to one row's cells
///
/// The evaluator and aggregator only ever read rows through this trait, so
/// callers can hand in stored rows, overlays with freshly computed values, or
/// their own storage types.
pub trait RowView {
    /// Row id
    fn row_id(&self) -> &str;

    /// Stored cell for a column, if one exists
    fn cell(&self, column_id: &str) -> Option<&CellValue>;

    /// Cell value for a column; missing cells read as null
    fn value(&self, column_id: &str) -> &CellValue {
        self.cell(column_id).unwrap_or(&NULL_VALUE)
    }
}

/// A stored row
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    pub id: String,
    /// Column id → raw value
    #[cfg_attr(feature = "serde", serde(default))]
    pub cells: HashMap<String, CellValue>,
}

impl Row {
    /// Create a new row without cells
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: HashMap::new(),
        }
    }

    /// Builder-style cell assignment
    pub fn with_cell(mut self, column_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column_id, value);
        self
    }

    /// Get a stored cell
    pub fn get(&self, column_id: &str) -> Option<&CellValue> {
        self.cells.get(column_id)
    }

    /// Set a cell, returning the previous value
    pub fn set(
        &mut self,
        column_id: impl Into<String>,
        value: impl Into<CellValue>,
    ) -> Option<CellValue> {
        self.cells.insert(column_id.into(), value.into())
    }

    /// Remove a cell
    pub fn remove(&mut self, column_id: &str) -> Option<CellValue> {
        self.cells.remove(column_id)
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl RowView for Row {
    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, column_id: &str) -> Option<&CellValue> {
        self.cells.get(column_id)
    }
}

/// A row with some cells replaced by computed values
///
/// Used to let formulas see the live value of rollup columns in the same row
/// without touching the stored row.
pub struct RowOverlay<'a> {
    base: &'a dyn RowView,
    values: HashMap<String, CellValue>,
}

impl<'a> RowOverlay<'a> {
    /// Create an overlay with no replaced cells
    pub fn new(base: &'a dyn RowView) -> Self {
        Self {
            base,
            values: HashMap::new(),
        }
    }

    /// Replace a cell value
    pub fn insert(&mut self, column_id: impl Into<String>, value: CellValue) {
        self.values.insert(column_id.into(), value);
    }

    /// Check whether a column has been replaced
    pub fn is_overlaid(&self, column_id: &str) -> bool {
        self.values.contains_key(column_id)
    }
}

impl RowView for RowOverlay<'_> {
    fn row_id(&self) -> &str {
        self.base.row_id()
    }

    fn cell(&self, column_id: &str) -> Option<&CellValue> {
        self.values
            .get(column_id)
            .or_else(|| self.base.cell(column_id))
    }
}
