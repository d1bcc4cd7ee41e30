//! Table calculation engine
//!
//! Computes every derived cell of a table: rollups first, then formulas,
//! which see the live rollup values of the same row. Rollups over a formula
//! or rollup column of a related table aggregate that table's freshly
//! computed values (see [`LiveTables`]).
//!
//! # Example
//!
//! ```rust
//! use notebase::prelude::*;
//!
//! let mut table = Table::new("orders", "Orders");
//! table.add_column(Column::new("c1", "Price", ColumnType::Number)).unwrap();
//! table.add_column(Column::new("c2", "Qty", ColumnType::Number)).unwrap();
//! table
//!     .add_column(Column::formula("c3", "Total", "prop(\"Price\") * prop(\"Qty\")"))
//!     .unwrap();
//! table
//!     .add_row(Row::new("r1").with_cell("c1", 10.0).with_cell("c2", 3.0))
//!     .unwrap();
//!
//! let calculation = table.calculate(&Workspace::new());
//! assert_eq!(calculation.row("r1").unwrap().display("c3").unwrap(), "30");
//! assert_eq!(calculation.stats.cells_calculated, 1);
//! ```

use crate::{
    compute_rollup_column, evaluate_column_with, evaluate_with, CellValue, Column, ColumnType,
    DependencyGraph, Error, EvaluationContext, FetchError, FormulaOutcome, RelatedTableFetcher,
    Result, RollupOutcome, RowOverlay, RowView, Table, Workspace,
};
use ahash::AHashMap;
use chrono::NaiveDate;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Options for table calculation
#[derive(Debug, Clone)]
pub struct CalculationOptions {
    /// Evaluate formula columns
    pub evaluate_formulas: bool,
    /// Compute rollup columns; when off, formulas see stored rollup values
    pub evaluate_rollups: bool,
    /// Date reported by `now()` (default: the local clock)
    pub today: Option<NaiveDate>,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            evaluate_formulas: true,
            evaluate_rollups: true,
            today: None,
        }
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Number of rows calculated
    pub rows: usize,
    /// Number of formula columns
    pub formula_columns: usize,
    /// Number of rollup columns
    pub rollup_columns: usize,
    /// Number of derived cells computed
    pub cells_calculated: usize,
    /// Number of formula cells that evaluated to an error
    pub errors: usize,
    /// Number of cells without a usable configuration
    pub unconfigured: usize,
    /// Number of formula columns on a reference cycle
    pub circular_references: usize,
}

impl CalculationStats {
    /// Add another run's counts to this one
    pub fn merge(&mut self, other: &CalculationStats) {
        self.rows += other.rows;
        self.formula_columns += other.formula_columns;
        self.rollup_columns += other.rollup_columns;
        self.cells_calculated += other.cells_calculated;
        self.errors += other.errors;
        self.unconfigured += other.unconfigured;
        self.circular_references += other.circular_references;
    }
}

/// A computed cell
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedValue {
    Formula(FormulaOutcome),
    Rollup(RollupOutcome),
}

impl DerivedValue {
    /// Text shown in the cell
    pub fn display(&self) -> String {
        match self {
            DerivedValue::Formula(outcome) => outcome.display(),
            DerivedValue::Rollup(outcome) => outcome.display(),
        }
    }

    /// Value stored back into the row
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            DerivedValue::Formula(outcome) => outcome.to_cell_value(),
            DerivedValue::Rollup(outcome) => outcome.to_cell_value(),
        }
    }

    /// Check if this is a formula error
    pub fn is_error(&self) -> bool {
        matches!(self, DerivedValue::Formula(FormulaOutcome::Error(_)))
    }

    /// Check if the column had nothing usable to compute
    pub fn is_unconfigured(&self) -> bool {
        matches!(
            self,
            DerivedValue::Formula(FormulaOutcome::Empty)
                | DerivedValue::Rollup(RollupOutcome::Unconfigured)
        )
    }
}

/// Derived cells of one row
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedRow {
    pub row_id: String,
    /// Column id → computed value
    pub values: BTreeMap<String, DerivedValue>,
}

impl CalculatedRow {
    /// Computed value of a column
    pub fn get(&self, column_id: &str) -> Option<&DerivedValue> {
        self.values.get(column_id)
    }

    /// Display text of a computed column
    pub fn display(&self, column_id: &str) -> Option<String> {
        self.get(column_id).map(DerivedValue::display)
    }
}

/// Result of calculating a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableCalculation {
    pub table_id: String,
    /// One entry per row, in table order
    pub rows: Vec<CalculatedRow>,
    pub stats: CalculationStats,
}

impl TableCalculation {
    /// Find the calculated row for a row id
    pub fn row(&self, row_id: &str) -> Option<&CalculatedRow> {
        self.rows.iter().find(|r| r.row_id == row_id)
    }
}

/// Extension trait for Table to add calculation methods
pub trait TableCalculationExt {
    /// Calculate all derived cells with default options
    fn calculate(&self, fetcher: &dyn RelatedTableFetcher) -> TableCalculation;

    /// Calculate all derived cells with custom options
    fn calculate_with_options(
        &self,
        fetcher: &dyn RelatedTableFetcher,
        options: &CalculationOptions,
    ) -> TableCalculation;

    /// Calculate the derived cells of one row
    fn calculate_row(
        &self,
        row: &dyn RowView,
        fetcher: &dyn RelatedTableFetcher,
        options: &CalculationOptions,
    ) -> CalculatedRow;

    /// Evaluate an ad-hoc formula against one row, with live rollup values
    fn evaluate_formula(
        &self,
        source: &str,
        row: &dyn RowView,
        fetcher: &dyn RelatedTableFetcher,
        options: &CalculationOptions,
    ) -> FormulaOutcome;

    /// Display text of every column of a row, in column order
    ///
    /// Computed columns show their calculated value when one is given and
    /// their stored value otherwise.
    fn display_row(&self, row: &dyn RowView, calculated: Option<&CalculatedRow>) -> Vec<String>;
}

impl TableCalculationExt for Table {
    fn calculate(&self, fetcher: &dyn RelatedTableFetcher) -> TableCalculation {
        self.calculate_with_options(fetcher, &CalculationOptions::default())
    }

    fn calculate_with_options(
        &self,
        fetcher: &dyn RelatedTableFetcher,
        options: &CalculationOptions,
    ) -> TableCalculation {
        let live = LiveTables::new(fetcher, options).entered(&self.id);
        calculate_table(self, &live, options)
    }

    fn calculate_row(
        &self,
        row: &dyn RowView,
        fetcher: &dyn RelatedTableFetcher,
        options: &CalculationOptions,
    ) -> CalculatedRow {
        let live = LiveTables::new(fetcher, options).entered(&self.id);
        calculate_row(self, row, &live, options)
    }

    fn evaluate_formula(
        &self,
        source: &str,
        row: &dyn RowView,
        fetcher: &dyn RelatedTableFetcher,
        options: &CalculationOptions,
    ) -> FormulaOutcome {
        let live = LiveTables::new(fetcher, options).entered(&self.id);
        let overlay = live_row(self, row, &live, options, None);
        evaluate_with(source, &context(&overlay, self, options))
    }

    fn display_row(&self, row: &dyn RowView, calculated: Option<&CalculatedRow>) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| {
                calculated
                    .and_then(|c| c.display(&column.id))
                    .unwrap_or_else(|| column.display_value(row.value(&column.id)))
            })
            .collect()
    }
}

fn calculate_table(
    table: &Table,
    fetcher: &dyn RelatedTableFetcher,
    options: &CalculationOptions,
) -> TableCalculation {
    let mut stats = CalculationStats {
        rows: table.rows.len(),
        formula_columns: columns_of(table, ColumnType::Formula).count(),
        rollup_columns: columns_of(table, ColumnType::Rollup).count(),
        ..Default::default()
    };

    let graph = DependencyGraph::from_columns(&table.columns);
    let circular = graph.circular_columns();
    if !circular.is_empty() {
        log::debug!(
            "table {} has circular formula columns: {}",
            table.id,
            circular.join(", ")
        );
    }
    stats.circular_references = circular.len();

    let rows: Vec<CalculatedRow> = table
        .rows
        .iter()
        .map(|row| calculate_row(table, row, fetcher, options))
        .collect();

    for value in rows.iter().flat_map(|r| r.values.values()) {
        stats.cells_calculated += 1;
        if value.is_error() {
            stats.errors += 1;
        }
        if value.is_unconfigured() {
            stats.unconfigured += 1;
        }
    }

    log::debug!(
        "calculated table {}: {} cells, {} errors",
        table.id,
        stats.cells_calculated,
        stats.errors
    );

    TableCalculation {
        table_id: table.id.clone(),
        rows,
        stats,
    }
}

fn calculate_row(
    table: &Table,
    row: &dyn RowView,
    fetcher: &dyn RelatedTableFetcher,
    options: &CalculationOptions,
) -> CalculatedRow {
    let mut values = BTreeMap::new();
    let overlay = live_row(table, row, fetcher, options, Some(&mut values));

    if options.evaluate_formulas {
        for column in columns_of(table, ColumnType::Formula) {
            let outcome = evaluate_column_with(column, context(&overlay, table, options));
            values.insert(column.id.clone(), DerivedValue::Formula(outcome));
        }
    }

    CalculatedRow {
        row_id: row.row_id().to_string(),
        values,
    }
}

/// Write computed values back into the rows they came from
fn store(table: &mut Table, calculation: TableCalculation) {
    for (row, calculated) in table.rows.iter_mut().zip(calculation.rows) {
        for (column_id, value) in calculated.values {
            let cell = value.to_cell_value();
            row.set(column_id, cell);
        }
    }
}

/// Fetcher that serves related tables with their derived cells computed
///
/// Wraps another fetcher. A table without formula or rollup columns is
/// passed through untouched; any other table is calculated first, so a
/// rollup over a related formula or rollup column aggregates live values.
///
/// Relations can loop back to a table that is already being calculated
/// further up the chain. That table is served with its stored values.
///
/// # Example
/// ```rust
/// use notebase::prelude::*;
/// use notebase::LiveTables;
///
/// let mut tasks = Table::new("tasks", "Tasks");
/// tasks.add_column(Column::new("hrs", "Hours", ColumnType::Number)).unwrap();
/// tasks.add_column(Column::formula("cost", "Cost", "prop(\"Hours\") * 10")).unwrap();
/// tasks.add_row(Row::new("t1").with_cell("hrs", 2.0)).unwrap();
///
/// let mut ws = Workspace::new();
/// ws.add_table(tasks).unwrap();
///
/// let options = CalculationOptions::default();
/// let live = LiveTables::new(&ws, &options);
/// let tasks = live.fetch_table("tasks").unwrap().unwrap();
/// assert_eq!(tasks.row("t1").unwrap().value("cost"), &CellValue::Number(20.0));
/// ```
pub struct LiveTables<'f> {
    inner: &'f dyn RelatedTableFetcher,
    options: CalculationOptions,
    /// Ids of the tables being calculated, outermost first
    in_progress: RefCell<Vec<String>>,
    computed: RefCell<AHashMap<String, Table>>,
    /// Number of times a table was served stored values to break a loop
    loops: Cell<usize>,
}

impl<'f> LiveTables<'f> {
    /// Wrap a fetcher
    pub fn new(inner: &'f dyn RelatedTableFetcher, options: &CalculationOptions) -> Self {
        Self {
            inner,
            options: options.clone(),
            in_progress: RefCell::new(Vec::new()),
            computed: RefCell::new(AHashMap::new()),
            loops: Cell::new(0),
        }
    }

    /// Mark a table as being calculated by the caller
    pub fn entered(self, table_id: &str) -> Self {
        self.in_progress.borrow_mut().push(table_id.to_string());
        self
    }

    fn is_in_progress(&self, table_id: &str) -> bool {
        self.in_progress.borrow().iter().any(|id| id == table_id)
    }
}

impl RelatedTableFetcher for LiveTables<'_> {
    fn fetch_table(
        &self,
        table_id: &str,
    ) -> std::result::Result<Option<Cow<'_, Table>>, FetchError> {
        if let Some(table) = self.computed.borrow().get(table_id) {
            return Ok(Some(Cow::Owned(table.clone())));
        }

        let table = match self.inner.fetch_table(table_id)? {
            Some(table) => table,
            None => return Ok(None),
        };
        if !table.columns.iter().any(|c| c.column_type.is_computed()) {
            return Ok(Some(table));
        }
        if self.is_in_progress(table_id) {
            log::debug!("relations loop back to table {}; using stored values", table_id);
            self.loops.set(self.loops.get() + 1);
            return Ok(Some(table));
        }

        let loops_before = self.loops.get();
        self.in_progress.borrow_mut().push(table_id.to_string());
        let calculation = calculate_table(&table, self, &self.options);
        self.in_progress.borrow_mut().pop();

        let mut table = table.into_owned();
        store(&mut table, calculation);
        // Results that hit a loop depend on where the chain started
        if self.loops.get() == loops_before {
            self.computed
                .borrow_mut()
                .insert(table_id.to_string(), table.clone());
        }
        Ok(Some(Cow::Owned(table)))
    }
}

fn columns_of(table: &Table, column_type: ColumnType) -> impl Iterator<Item = &Column> + '_ {
    table
        .columns
        .iter()
        .filter(move |c| c.column_type == column_type)
}

/// The row with rollup cells replaced by freshly computed values
fn live_row<'r>(
    table: &Table,
    row: &'r dyn RowView,
    fetcher: &dyn RelatedTableFetcher,
    options: &CalculationOptions,
    mut record: Option<&mut BTreeMap<String, DerivedValue>>,
) -> RowOverlay<'r> {
    let mut overlay = RowOverlay::new(row);
    if !options.evaluate_rollups {
        return overlay;
    }

    for column in columns_of(table, ColumnType::Rollup) {
        let outcome = compute_rollup_column(column, row, table, fetcher);
        overlay.insert(column.id.clone(), outcome.to_cell_value());
        if let Some(values) = record.as_deref_mut() {
            values.insert(column.id.clone(), DerivedValue::Rollup(outcome));
        }
    }
    overlay
}

fn context<'a>(
    row: &'a dyn RowView,
    table: &'a Table,
    options: &CalculationOptions,
) -> EvaluationContext<'a> {
    let ctx = EvaluationContext::new(row, &table.columns);
    match options.today {
        Some(today) => ctx.with_today(today),
        None => ctx,
    }
}

/// Extension trait for Workspace to calculate and store every derived cell
pub trait WorkspaceCalculationExt {
    /// Calculate all tables with default options
    fn calculate(&mut self) -> Result<CalculationStats>;

    /// Calculate all tables with custom options
    ///
    /// Computed values are written back into the rows, where they serve as
    /// the stored fallback of formula and rollup columns.
    fn calculate_with_options(&mut self, options: &CalculationOptions) -> Result<CalculationStats>;
}

impl WorkspaceCalculationExt for Workspace {
    fn calculate(&mut self) -> Result<CalculationStats> {
        self.calculate_with_options(&CalculationOptions::default())
    }

    fn calculate_with_options(&mut self, options: &CalculationOptions) -> Result<CalculationStats> {
        // Compute against a consistent snapshot, then store
        let calculations: Vec<TableCalculation> = self
            .tables()
            .iter()
            .map(|table| table.calculate_with_options(&*self, options))
            .collect();

        let mut stats = CalculationStats::default();
        for calculation in calculations {
            stats.merge(&calculation.stats);
            let table = self
                .table_mut(&calculation.table_id)
                .ok_or_else(|| Error::TableNotFound(calculation.table_id.clone()))?;
            store(table, calculation);
        }

        Ok(stats)
    }
}
