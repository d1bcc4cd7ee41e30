//! # notebase-formula
//!
//! Formula parser and evaluator for notebase formula columns.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → value) against one row
//! - A closed set of built-in functions
//! - Rename-safe `prop` references
//! - Dependency tracking between computed columns
//!
//! Formulas are never executed as code: the source is parsed into an AST and
//! walked by the evaluator.
//!
//! ## Example
//!
//! ```rust
//! use notebase_core::{Column, ColumnType, Row};
//! use notebase_formula::evaluate;
//!
//! let columns = vec![Column::new("c1", "Name", ColumnType::Text)];
//! let row = Row::new("r1").with_cell("c1", "Ada");
//!
//! let outcome = evaluate("concat(\"Hello, \", prop(\"Name\"))", &row, &columns);
//! assert_eq!(outcome.display(), "Hello, Ada");
//! ```

pub mod ast;
pub mod binding;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod outcome;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, PropertyRef, UnaryOperator};
pub use binding::FormulaBinding;
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate_expr, EvaluationCache, EvaluationContext, FormulaValue};
pub use outcome::{
    evaluate, evaluate_column, evaluate_column_with, evaluate_with, ComputedValue, FormulaOutcome,
};
pub use parser::parse_formula;
