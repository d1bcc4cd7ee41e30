//! Formula evaluation entry points
//!
//! These never fail: parse and evaluation errors come back as
//! [`FormulaOutcome::Error`] and are logged at debug level.

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate_expr, EvaluationCache, EvaluationContext, FormulaValue};
use crate::parser::parse_formula;
use notebase_core::coerce;
use notebase_core::{CellValue, Column, RowView, ERROR_DISPLAY, FORMULA_UNCONFIGURED_DISPLAY};
use std::fmt;

/// A successfully computed formula value
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedValue {
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl ComputedValue {
    /// Display string
    pub fn display(&self) -> String {
        match self {
            ComputedValue::Number(n) => coerce::format_number(*n),
            ComputedValue::Text(s) => s.clone(),
            ComputedValue::Boolean(b) => b.to_string(),
        }
    }
}

impl From<FormulaValue> for ComputedValue {
    /// Empty means a null cell, which formulas read as zero
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) => ComputedValue::Number(n),
            FormulaValue::Text(s) => ComputedValue::Text(s),
            FormulaValue::Boolean(b) => ComputedValue::Boolean(b),
            FormulaValue::Empty => ComputedValue::Number(0.0),
        }
    }
}

impl From<ComputedValue> for CellValue {
    fn from(value: ComputedValue) -> Self {
        match value {
            ComputedValue::Number(n) => CellValue::Number(n),
            ComputedValue::Text(s) => CellValue::Text(s),
            ComputedValue::Boolean(b) => CellValue::Boolean(b),
        }
    }
}

/// Result of evaluating a formula for one row
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaOutcome {
    Computed(ComputedValue),
    /// No formula configured
    Empty,
    Error(FormulaError),
}

impl FormulaOutcome {
    /// Text shown in the cell
    ///
    /// Errors show [`ERROR_DISPLAY`]; an unconfigured formula shows nothing
    /// (see [`FormulaOutcome::placeholder`]).
    pub fn display(&self) -> String {
        match self {
            FormulaOutcome::Computed(v) => v.display(),
            FormulaOutcome::Empty => String::new(),
            FormulaOutcome::Error(_) => ERROR_DISPLAY.to_string(),
        }
    }

    /// Hint shown in place of an empty value by interactive renderers
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            FormulaOutcome::Empty => Some(FORMULA_UNCONFIGURED_DISPLAY),
            _ => None,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaOutcome::Error(_))
    }

    /// The computed value, if any
    pub fn value(&self) -> Option<&ComputedValue> {
        match self {
            FormulaOutcome::Computed(v) => Some(v),
            _ => None,
        }
    }

    /// Cell value for storage or further computation
    ///
    /// Empty and error outcomes become null.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            FormulaOutcome::Computed(v) => v.clone().into(),
            _ => CellValue::Null,
        }
    }
}

impl fmt::Display for FormulaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<FormulaResult<FormulaValue>> for FormulaOutcome {
    fn from(result: FormulaResult<FormulaValue>) -> Self {
        match result {
            Ok(value) => FormulaOutcome::Computed(value.into()),
            Err(e) => FormulaOutcome::Error(e),
        }
    }
}

/// Evaluate a formula source for one row
///
/// `prop` names resolve by exact column name. Blank sources give
/// [`FormulaOutcome::Empty`].
///
/// # Example
/// ```rust
/// use notebase_core::{Column, ColumnType, Row};
/// use notebase_formula::{evaluate, ComputedValue, FormulaOutcome};
///
/// let columns = vec![
///     Column::new("c1", "Price", ColumnType::Number),
///     Column::new("c2", "Qty", ColumnType::Number),
/// ];
/// let row = Row::new("r1").with_cell("c1", 10.0).with_cell("c2", 3.0);
///
/// let outcome = evaluate("prop(\"Price\") * prop(\"Qty\")", &row, &columns);
/// assert_eq!(outcome, FormulaOutcome::Computed(ComputedValue::Number(30.0)));
/// ```
pub fn evaluate(source: &str, row: &dyn RowView, columns: &[Column]) -> FormulaOutcome {
    evaluate_with(source, &EvaluationContext::new(row, columns))
}

/// Evaluate a formula source in a prepared context
pub fn evaluate_with(source: &str, ctx: &EvaluationContext) -> FormulaOutcome {
    if source.trim().is_empty() {
        return FormulaOutcome::Empty;
    }

    let cache = EvaluationCache::new();
    let ctx = if ctx.has_cache() {
        *ctx
    } else {
        ctx.with_cache(&cache)
    };

    let result = parse_formula(source).and_then(|ast| evaluate_expr(&ast, &ctx));
    if let Err(e) = &result {
        log::debug!("formula `{}` failed for row {}: {}", source, ctx.row.row_id(), e);
    }
    result.into()
}

/// Evaluate a formula column for one row, using its saved id bindings
///
/// Columns that are not formula columns, or have no formula yet, give
/// [`FormulaOutcome::Empty`].
pub fn evaluate_column(column: &Column, row: &dyn RowView, columns: &[Column]) -> FormulaOutcome {
    evaluate_column_with(column, EvaluationContext::new(row, columns))
}

/// Evaluate a formula column in a prepared context
pub fn evaluate_column_with<'a>(
    column: &'a Column,
    ctx: EvaluationContext<'a>,
) -> FormulaOutcome {
    match column.formula_options() {
        Some(opts) if opts.has_valid_config() => {
            evaluate_with(&opts.source, &ctx.for_column(column))
        }
        _ => FormulaOutcome::Empty,
    }
}
