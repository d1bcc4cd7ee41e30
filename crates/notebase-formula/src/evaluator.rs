//! Formula evaluator
//!
//! Evaluates formula ASTs against one row of a table.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use ahash::AHashMap;
use chrono::{Local, NaiveDate};
use notebase_core::coerce;
use notebase_core::{CellValue, Column, ColumnType, RowView};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// A null or missing cell
    Empty,
}

impl FormulaValue {
    /// Convert a stored cell to a formula value
    ///
    /// Select option ids become labels. Text that is entirely a number
    /// becomes a number. Lists and timestamps become their display text.
    pub fn from_cell(column: &Column, value: &CellValue) -> Self {
        match column.resolve_labels(value).as_ref() {
            CellValue::Null => FormulaValue::Empty,
            CellValue::Number(n) if n.is_finite() => FormulaValue::Number(*n),
            CellValue::Number(_) => FormulaValue::Empty,
            CellValue::Boolean(b) => FormulaValue::Boolean(*b),
            CellValue::Text(s) => match coerce::parse_number(s) {
                Some(n) => FormulaValue::Number(n),
                None => FormulaValue::Text(s.clone()),
            },
            other @ (CellValue::List(_) | CellValue::Timestamp(_)) => {
                FormulaValue::Text(coerce::to_display_string(other))
            }
        }
    }

    /// Convert to number, if the value has a numeric reading
    ///
    /// Text never converts; it only takes part in concatenation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Text(_) => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self) -> FormulaResult<f64> {
        self.as_number().ok_or_else(|| {
            FormulaError::TypeMismatch(format!(
                "expected a number, got text \"{}\"",
                self.as_string()
            ))
        })
    }

    /// Truthiness used by `if`
    pub fn is_truthy(&self) -> bool {
        match self {
            FormulaValue::Boolean(b) => *b,
            FormulaValue::Number(n) => *n != 0.0,
            FormulaValue::Text(s) => !s.is_empty(),
            FormulaValue::Empty => false,
        }
    }

    /// Whether `empty()` reports this value as empty
    pub fn is_empty(&self) -> bool {
        match self {
            FormulaValue::Empty => true,
            FormulaValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Display string; empty displays as nothing
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => coerce::format_number(*n),
            FormulaValue::Text(s) => s.clone(),
            FormulaValue::Boolean(b) => b.to_string(),
            FormulaValue::Empty => String::new(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FormulaValue::Number(_) => "number",
            FormulaValue::Text(_) => "text",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Empty => "empty",
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => CellValue::Null,
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::Text(s) => CellValue::Text(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
        }
    }
}

/// Results of the formula columns already evaluated for one row
///
/// A context and all of its children share one cache, so a column referenced
/// many times is parsed and evaluated once. Only valid for a single row.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    results: RefCell<AHashMap<String, FormulaResult<FormulaValue>>>,
}

impl EvaluationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of formula columns evaluated so far
    pub fn len(&self) -> usize {
        self.results.borrow().len()
    }

    /// Check if nothing was evaluated yet
    pub fn is_empty(&self) -> bool {
        self.results.borrow().is_empty()
    }

    fn get(&self, column_id: &str) -> Option<FormulaResult<FormulaValue>> {
        self.results.borrow().get(column_id).cloned()
    }

    fn insert(&self, column_id: &str, result: FormulaResult<FormulaValue>) {
        self.results.borrow_mut().insert(column_id.to_string(), result);
    }
}

/// Context for formula evaluation
///
/// Nested evaluation of a referenced formula column runs in a child context
/// that points back at its parent. The chain of `current_column`s is the set
/// of formula columns on the current evaluation path.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// The row being evaluated
    pub row: &'a dyn RowView,
    /// Columns of the row's table
    pub columns: &'a [Column],
    bindings: Option<&'a BTreeMap<String, String>>,
    today: Option<NaiveDate>,
    current_column: Option<&'a str>,
    parent: Option<&'a EvaluationContext<'a>>,
    cache: Option<&'a EvaluationCache>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context for a row of a table
    pub fn new(row: &'a dyn RowView, columns: &'a [Column]) -> Self {
        Self {
            row,
            columns,
            bindings: None,
            today: None,
            current_column: None,
            parent: None,
            cache: None,
        }
    }

    /// Fix the date `now()` returns
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Resolve `prop` names through saved name → column id bindings first
    pub fn with_bindings(mut self, bindings: &'a BTreeMap<String, String>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// Share evaluated formula columns through `cache`
    pub fn with_cache(mut self, cache: &'a EvaluationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Check if a cache is attached
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Evaluate on behalf of a formula column: use its bindings and treat it
    /// as already on the evaluation path
    pub fn for_column(mut self, column: &'a Column) -> Self {
        if let Some(opts) = column.formula_options() {
            self.bindings = Some(&opts.references);
        }
        self.current_column = Some(column.id.as_str());
        self
    }

    /// The date `now()` returns
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Find the column a `prop` name refers to
    ///
    /// A binding to a column id that still exists wins over name lookup.
    pub fn resolve_column(&self, name: &str) -> Option<&'a Column> {
        resolve_column(self.columns, self.bindings, name)
    }

    fn is_on_path(&self, column_id: &str) -> bool {
        self.current_column == Some(column_id)
            || self.parent.map_or(false, |p| p.is_on_path(column_id))
    }

    fn child<'b>(&'b self, column: &'b Column) -> EvaluationContext<'b> {
        EvaluationContext {
            row: self.row,
            columns: self.columns,
            bindings: column.formula_options().map(|opts| &opts.references),
            today: self.today,
            current_column: Some(column.id.as_str()),
            parent: Some(self),
            cache: self.cache,
        }
    }

    /// Value of `prop(name)` for the current row
    pub fn property_value(&self, name: &str) -> FormulaResult<FormulaValue> {
        let column = self
            .resolve_column(name)
            .ok_or_else(|| FormulaError::UnknownProperty(name.to_string()))?;

        if column.column_type != ColumnType::Formula {
            return Ok(FormulaValue::from_cell(column, self.row.value(&column.id)));
        }

        if self.is_on_path(&column.id) {
            return Err(FormulaError::CircularReference(name.to_string()));
        }
        if let Some(hit) = self.cache.and_then(|c| c.get(&column.id)) {
            return hit;
        }

        let result = match column.formula_options() {
            Some(opts) if opts.has_valid_config() => parse_formula(&opts.source)
                .and_then(|ast| evaluate_expr(&ast, &self.child(column))),
            _ => Ok(FormulaValue::Empty),
        };
        if let Some(cache) = self.cache {
            cache.insert(&column.id, result.clone());
        }
        result
    }
}

/// Resolve a `prop` name against a table's columns
pub(crate) fn resolve_column<'c>(
    columns: &'c [Column],
    bindings: Option<&BTreeMap<String, String>>,
    name: &str,
) -> Option<&'c Column> {
    bindings
        .and_then(|b| b.get(name))
        .and_then(|id| columns.iter().find(|c| &c.id == id))
        .or_else(|| columns.iter().find(|c| c.name == name))
}

/// Evaluate a formula AST
pub fn evaluate_expr(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::Text(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),

        // === References ===
        FormulaExpr::PropertyRef(r) => ctx.property_value(&r.name),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate_expr(left, ctx)?;
    let right_val = evaluate_expr(right, ctx)?;

    match op {
        BinaryOperator::Add => {
            // any text side turns `+` into concatenation; empty joins as ""
            if matches!(left_val, FormulaValue::Text(_))
                || matches!(right_val, FormulaValue::Text(_))
            {
                return Ok(FormulaValue::Text(left_val.as_string() + &right_val.as_string()));
            }
            arithmetic(&left_val, &right_val, |l, r| Ok(l + r))
        }
        BinaryOperator::Subtract => arithmetic(&left_val, &right_val, |l, r| Ok(l - r)),
        BinaryOperator::Multiply => arithmetic(&left_val, &right_val, |l, r| Ok(l * r)),
        BinaryOperator::Divide => arithmetic(&left_val, &right_val, |l, r| {
            if r == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(l / r)
            }
        }),

        BinaryOperator::Equal => Ok(FormulaValue::Boolean(values_equal(&left_val, &right_val))),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(!values_equal(&left_val, &right_val))),

        BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => {
            let ordering = compare_values(&left_val, &right_val).ok_or_else(|| {
                FormulaError::TypeMismatch(format!(
                    "cannot compare {} {} {}",
                    left_val.kind(),
                    op.symbol(),
                    right_val.kind()
                ))
            })?;
            let result = match op {
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(FormulaValue::Boolean(result))
        }
    }
}

fn arithmetic(
    left: &FormulaValue,
    right: &FormulaValue,
    f: impl FnOnce(f64, f64) -> FormulaResult<f64>,
) -> FormulaResult<FormulaValue> {
    let result = f(left.to_number()?, right.to_number()?)?;
    finite(result)
}

/// Reject NaN and infinities
pub(crate) fn finite(n: f64) -> FormulaResult<FormulaValue> {
    if n.is_finite() {
        Ok(FormulaValue::Number(n))
    } else {
        Err(FormulaError::NotFinite)
    }
}

/// Equality for `==` / `!=`
///
/// Numbers, booleans and empty compare numerically with each other. Texts
/// compare exactly. Empty equals empty text. Any other mix is unequal.
fn values_equal(left: &FormulaValue, right: &FormulaValue) -> bool {
    match (left, right) {
        (FormulaValue::Text(l), FormulaValue::Text(r)) => l == r,
        (FormulaValue::Text(s), FormulaValue::Empty)
        | (FormulaValue::Empty, FormulaValue::Text(s)) => s.is_empty(),
        (FormulaValue::Text(_), _) | (_, FormulaValue::Text(_)) => false,
        (l, r) => l.as_number() == r.as_number(),
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`
///
/// Both sides must be text, or both must have a numeric reading.
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Option<Ordering> {
    match (left, right) {
        (FormulaValue::Text(l), FormulaValue::Text(r)) => Some(l.cmp(r)),
        (FormulaValue::Text(_), _) | (_, FormulaValue::Text(_)) => None,
        (l, r) => l.as_number()?.partial_cmp(&r.as_number()?),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate_expr(operand, ctx)?;

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-val.to_number()?)),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    // `if` only evaluates the branch it takes
    if name == "if" {
        if args.len() != 3 {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: "exactly 3".to_string(),
                actual: args.len(),
            });
        }
        let condition = evaluate_expr(&args[0], ctx)?;
        let branch = if condition.is_truthy() { &args[1] } else { &args[2] };
        return evaluate_expr(branch, ctx);
    }

    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate_expr(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebase_core::{Row, SelectOption};
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("c-name", "Name", ColumnType::Text),
            Column::new("c-price", "Price", ColumnType::Number),
            Column::new("c-qty", "Qty", ColumnType::Text),
            Column::new("c-done", "Done", ColumnType::Checkbox),
            Column::new("c-notes", "Notes", ColumnType::Text),
            Column::select(
                "c-status",
                "Status",
                vec![SelectOption::new("s1", "Open", "blue"), SelectOption::new("s2", "42", "red")],
            ),
            Column::new("c-tags", "Tags", ColumnType::MultiSelect),
            Column::formula("c-total", "Total", "prop(\"Price\") * prop(\"Qty\")"),
            Column::formula("c-loop-a", "Loop A", "prop(\"Loop B\") + 1"),
            Column::formula("c-loop-b", "Loop B", "prop(\"Loop A\") + 1"),
            Column::formula("c-self", "Self", "prop(\"Self\")"),
            Column::formula("c-blank", "Blank", "  "),
        ]
    }

    fn row() -> Row {
        Row::new("r1")
            .with_cell("c-name", "Ada")
            .with_cell("c-price", 10.0)
            .with_cell("c-qty", " 3 ")
            .with_cell("c-done", true)
            .with_cell("c-status", "s1")
            .with_cell("c-tags", vec!["x".to_string(), "y".to_string()])
    }

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let columns = columns();
        let row = row();
        let ctx = EvaluationContext::new(&row, &columns);
        evaluate_expr(&ast, &ctx)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(eval("\"hi\"").unwrap(), FormulaValue::Text("hi".into()));
        assert_eq!(eval("true").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("10-3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("4*5").unwrap(), FormulaValue::Number(20.0));
        assert_eq!(eval("20/4").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("1+2*3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("(1+2)*3").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("-5 + 2").unwrap(), FormulaValue::Number(-3.0));
        assert_eq!(eval("true + true").unwrap(), FormulaValue::Number(2.0));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        assert_eq!(eval("1/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("1/prop(\"Notes\")"), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_evaluate_not_finite() {
        assert_eq!(eval("1e308 * 10"), Err(FormulaError::NotFinite));
    }

    #[test]
    fn test_text_operands() {
        assert_eq!(
            eval("\"a\" + \"b\"").unwrap(),
            FormulaValue::Text("ab".into())
        );
        assert_eq!(eval("\"a\" + 1").unwrap(), FormulaValue::Text("a1".into()));
        assert_eq!(
            eval("\"Qty: \" + prop(\"Qty\")").unwrap(),
            FormulaValue::Text("Qty: 3".into())
        );
        assert_eq!(
            eval("prop(\"Notes\") + \" \" + prop(\"Name\")").unwrap(),
            FormulaValue::Text(" Ada".into())
        );
        assert_eq!(
            eval("prop(\"Name\") + prop(\"Notes\")").unwrap(),
            FormulaValue::Text("Ada".into())
        );
        assert!(matches!(
            eval("\"a\" - 1"),
            Err(FormulaError::TypeMismatch(_))
        ));
        assert!(matches!(
            eval("prop(\"Name\") * 2"),
            Err(FormulaError::TypeMismatch(_))
        ));
        assert!(matches!(eval("-\"a\""), Err(FormulaError::TypeMismatch(_))));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("1 < 2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("2 <= 2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("1 > 2").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("3 >= 4").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("1 == 1").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("\"b\" > \"a\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("true == 1").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_mixed_comparison() {
        assert_eq!(eval("1 == \"1\"").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("1 != \"1\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(
            eval("prop(\"Notes\") == \"\"").unwrap(),
            FormulaValue::Boolean(true)
        );
        assert!(matches!(
            eval("1 < \"2\""),
            Err(FormulaError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_property_coercion() {
        assert_eq!(eval("prop(\"Name\")").unwrap(), FormulaValue::Text("Ada".into()));
        assert_eq!(eval("prop(\"Qty\")").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("prop(\"Done\")").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("prop(\"Notes\")").unwrap(), FormulaValue::Empty);
        assert_eq!(eval("prop(\"Status\")").unwrap(), FormulaValue::Text("Open".into()));
        assert_eq!(eval("prop(\"Tags\")").unwrap(), FormulaValue::Text("x, y".into()));
        assert_eq!(eval("prop(\"Notes\") + 5").unwrap(), FormulaValue::Number(5.0));
    }

    #[test]
    fn test_numeric_select_label() {
        let columns = columns();
        let row = Row::new("r2").with_cell("c-status", "s2");
        let ctx = EvaluationContext::new(&row, &columns);
        let ast = parse_formula("prop(\"Status\") + 1").unwrap();
        assert_eq!(evaluate_expr(&ast, &ctx).unwrap(), FormulaValue::Number(43.0));
    }

    #[test]
    fn test_unknown_property() {
        assert_eq!(
            eval("prop(\"Nope\")"),
            Err(FormulaError::UnknownProperty("Nope".into()))
        );
        // name matching is case-sensitive
        assert!(eval("prop(\"price\")").is_err());
    }

    #[test]
    fn test_nested_formula_column() {
        assert_eq!(eval("prop(\"Total\") + 1").unwrap(), FormulaValue::Number(31.0));
        assert_eq!(eval("prop(\"Blank\")").unwrap(), FormulaValue::Empty);
    }

    #[test]
    fn test_shared_cache_evaluates_each_column_once() {
        // each column reads the previous one twice
        let mut columns = vec![Column::new("c0", "C0", ColumnType::Number)];
        for i in 1..=40 {
            let prev = format!("C{}", i - 1);
            columns.push(Column::formula(
                format!("c{}", i),
                format!("C{}", i),
                format!("prop(\"{}\") + prop(\"{}\")", prev, prev),
            ));
        }
        let row = Row::new("r1").with_cell("c0", 1.0);
        let cache = EvaluationCache::new();
        let ctx = EvaluationContext::new(&row, &columns).with_cache(&cache);

        let started = std::time::Instant::now();
        let ast = parse_formula("prop(\"C40\")").unwrap();
        assert_eq!(evaluate_expr(&ast, &ctx).unwrap(), FormulaValue::Number(2f64.powi(40)));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(cache.len(), 40);
    }

    #[test]
    fn test_circular_reference() {
        assert!(matches!(
            eval("prop(\"Loop A\")"),
            Err(FormulaError::CircularReference(_))
        ));

        let columns = columns();
        let row = row();
        let self_col = &columns[10];
        let ctx = EvaluationContext::new(&row, &columns).for_column(self_col);
        let ast = parse_formula("prop(\"Self\")").unwrap();
        assert_eq!(
            evaluate_expr(&ast, &ctx),
            Err(FormulaError::CircularReference("Self".into()))
        );
    }

    #[test]
    fn test_bindings_win_over_names() {
        let columns = columns();
        let row = row();
        let mut bindings = BTreeMap::new();
        bindings.insert("Cost".to_string(), "c-price".to_string());
        bindings.insert("Name".to_string(), "c-gone".to_string());
        let ctx = EvaluationContext::new(&row, &columns).with_bindings(&bindings);

        let ast = parse_formula("prop(\"Cost\")").unwrap();
        assert_eq!(evaluate_expr(&ast, &ctx).unwrap(), FormulaValue::Number(10.0));

        // stale binding falls back to the name
        let ast = parse_formula("prop(\"Name\")").unwrap();
        assert_eq!(evaluate_expr(&ast, &ctx).unwrap(), FormulaValue::Text("Ada".into()));
    }

    #[test]
    fn test_evaluate_if_is_lazy() {
        assert_eq!(
            eval("if(prop(\"Price\") > 5, \"big\", 1/0)").unwrap(),
            FormulaValue::Text("big".into())
        );
        assert_eq!(
            eval("if(prop(\"Notes\"), prop(\"Nope\"), \"none\")").unwrap(),
            FormulaValue::Text("none".into())
        );
        assert!(matches!(
            eval("if(true, 1)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            eval("alert(1)"),
            Err(FormulaError::UnknownFunction("alert".into()))
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(FormulaValue::Number(-1.0).is_truthy());
        assert!(!FormulaValue::Number(0.0).is_truthy());
        assert!(FormulaValue::Text("x".into()).is_truthy());
        assert!(!FormulaValue::Text(String::new()).is_truthy());
        assert!(!FormulaValue::Empty.is_truthy());
    }
}
