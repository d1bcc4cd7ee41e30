//! Rollup computation

use crate::aggregate::aggregate;
use crate::error::UnconfiguredReason;
use crate::fetcher::RelatedTableFetcher;
use notebase_core::coerce;
use notebase_core::{
    Aggregation, CellValue, Column, ColumnType, RollupOptions, RowView, Table,
    ROLLUP_UNCONFIGURED_DISPLAY,
};
use std::borrow::Cow;
use std::fmt;

/// Result of computing a rollup for one row
#[derive(Debug, Clone, PartialEq)]
pub enum RollupOutcome {
    Number(f64),
    Text(String),
    /// Nothing to aggregate (e.g. average of no numbers)
    Empty,
    /// The rollup cannot be computed for this row
    Unconfigured,
}

impl RollupOutcome {
    /// Text shown in the cell
    pub fn display(&self) -> String {
        match self {
            RollupOutcome::Number(n) => coerce::format_number(*n),
            RollupOutcome::Text(s) => s.clone(),
            RollupOutcome::Empty => String::new(),
            RollupOutcome::Unconfigured => ROLLUP_UNCONFIGURED_DISPLAY.to_string(),
        }
    }

    /// Cell value for formulas that reference the rollup
    ///
    /// Empty and unconfigured outcomes become null.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            RollupOutcome::Number(n) => CellValue::Number(*n),
            RollupOutcome::Text(s) => CellValue::Text(s.clone()),
            RollupOutcome::Empty | RollupOutcome::Unconfigured => CellValue::Null,
        }
    }

    /// Check if this is the unconfigured sentinel
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, RollupOutcome::Unconfigured)
    }
}

impl fmt::Display for RollupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// A rollup whose relation, related table and target column all exist
struct ResolvedRollup<'t> {
    relation_column_id: &'t str,
    related: Cow<'t, Table>,
    target_column_id: String,
    aggregation: Aggregation,
}

impl ResolvedRollup<'_> {
    fn target_column(&self) -> Option<&Column> {
        self.related.column(&self.target_column_id)
    }
}

fn resolve<'t>(
    config: &'t RollupOptions,
    table: &'t Table,
    fetcher: &'t dyn RelatedTableFetcher,
) -> Result<ResolvedRollup<'t>, UnconfiguredReason> {
    if !config.has_valid_config() {
        return Err(UnconfiguredReason::MissingSettings);
    }
    let (relation_id, target_name, aggregation) = match (
        config.relation_column_id.as_deref(),
        config.target_property_name.as_deref(),
        config.aggregation,
    ) {
        (Some(r), Some(t), Some(a)) => (r, t, a),
        _ => return Err(UnconfiguredReason::MissingSettings),
    };

    let relation = table
        .column(relation_id)
        .ok_or_else(|| UnconfiguredReason::RelationColumnNotFound(relation_id.to_string()))?;
    if relation.column_type != ColumnType::Relation {
        return Err(UnconfiguredReason::NotARelation(relation.name.clone()));
    }
    let related_table_id = relation
        .relation_options()
        .and_then(|opts| opts.related_table_id.as_deref())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| UnconfiguredReason::NoRelatedTable(relation.name.clone()))?;

    let related = match fetcher.fetch_table(related_table_id) {
        Ok(Some(related)) => related,
        Ok(None) => {
            return Err(UnconfiguredReason::RelatedTableNotFound(
                related_table_id.to_string(),
            ))
        }
        Err(error) => {
            log::warn!("failed to fetch related table {}: {}", related_table_id, error);
            return Err(UnconfiguredReason::FetchFailed {
                table_id: related_table_id.to_string(),
                error,
            });
        }
    };

    let target_column_id = related
        .column_by_name(target_name)
        .map(|c| c.id.clone())
        .ok_or_else(|| UnconfiguredReason::TargetNotFound(target_name.to_string()))?;

    Ok(ResolvedRollup {
        relation_column_id: &relation.id,
        related,
        target_column_id,
        aggregation,
    })
}

/// Check that a rollup can be computed, independent of any row
///
/// Fetches the related table once. Rows that link to nothing still show
/// the unconfigured sentinel even when this succeeds.
pub fn check_rollup(
    config: &RollupOptions,
    table: &Table,
    fetcher: &dyn RelatedTableFetcher,
) -> Result<(), UnconfiguredReason> {
    resolve(config, table, fetcher).map(|_| ())
}

/// Compute a rollup for one row
///
/// Never fails: anything missing along the way (settings, relation column,
/// related table, target column, linked rows) gives
/// [`RollupOutcome::Unconfigured`].
///
/// Target cells are read as the fetcher serves them. For a formula or rollup
/// target, pass a fetcher that serves related tables with their derived
/// cells already computed (the `notebase` facade provides one).
///
/// # Example
/// ```rust
/// use notebase_core::{Aggregation, Column, ColumnType, RollupOptions, Row, Table, Workspace};
/// use notebase_rollup::{compute_rollup, RollupOutcome};
///
/// let mut tasks = Table::new("tasks", "Tasks");
/// tasks.add_column(Column::new("hrs", "Hours", ColumnType::Number)).unwrap();
/// tasks.add_row(Row::new("t1").with_cell("hrs", 2.0)).unwrap();
/// tasks.add_row(Row::new("t2").with_cell("hrs", 3.0)).unwrap();
///
/// let mut projects = Table::new("projects", "Projects");
/// projects.add_column(Column::relation("rel", "Tasks", "tasks")).unwrap();
/// let row = Row::new("p1").with_cell("rel", vec!["t1".to_string(), "t2".to_string()]);
///
/// let mut ws = Workspace::new();
/// ws.add_table(tasks).unwrap();
///
/// let config = RollupOptions::new("rel", "Hours", Aggregation::Sum);
/// assert_eq!(compute_rollup(&config, &row, &projects, &ws), RollupOutcome::Number(5.0));
/// ```
pub fn compute_rollup(
    config: &RollupOptions,
    row: &dyn RowView,
    table: &Table,
    fetcher: &dyn RelatedTableFetcher,
) -> RollupOutcome {
    match try_compute(config, row, table, fetcher) {
        Ok(outcome) => outcome,
        Err(reason) => {
            log::trace!("rollup unconfigured for row {}: {}", row.row_id(), reason);
            RollupOutcome::Unconfigured
        }
    }
}

/// Compute a rollup column for one row
///
/// Columns that are not rollup columns give [`RollupOutcome::Unconfigured`].
pub fn compute_rollup_column(
    column: &Column,
    row: &dyn RowView,
    table: &Table,
    fetcher: &dyn RelatedTableFetcher,
) -> RollupOutcome {
    match column.rollup_options() {
        Some(config) => compute_rollup(config, row, table, fetcher),
        None => RollupOutcome::Unconfigured,
    }
}

fn try_compute(
    config: &RollupOptions,
    row: &dyn RowView,
    table: &Table,
    fetcher: &dyn RelatedTableFetcher,
) -> Result<RollupOutcome, UnconfiguredReason> {
    let resolved = resolve(config, table, fetcher)?;

    let ids = row.value(resolved.relation_column_id).as_id_list();
    if ids.is_empty() {
        return Err(UnconfiguredReason::NoRelatedRows);
    }

    let target = resolved
        .target_column()
        .ok_or_else(|| UnconfiguredReason::TargetNotFound(resolved.target_column_id.clone()))?;
    let values: Vec<CellValue> = ids
        .iter()
        .map(|id| match resolved.related.row(id) {
            Some(related_row) => target.resolve_labels(related_row.value(&target.id)).into_owned(),
            None => CellValue::Null,
        })
        .collect();

    Ok(aggregate(resolved.aggregation, ids.len(), &values))
}
