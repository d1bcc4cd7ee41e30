//! Database table

use crate::cell::CellValue;
use crate::column::{Column, ColumnType};
use crate::error::{Error, Result};
use crate::row::Row;

/// The part of a column the evaluator needs to resolve references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub column_type: ColumnType,
}

/// A database table: ordered columns plus rows
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub columns: Vec<Column>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rows: Vec<Row>,
}

impl Table {
    /// Create an empty table
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a column
    ///
    /// Existing rows are not touched: they simply have no cell for the new
    /// column, which reads as null.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.id).is_some() {
            return Err(Error::DuplicateColumn(column.id));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column and its cells
    ///
    /// Formulas and rollups that refer to it are left alone; they degrade
    /// when evaluated.
    pub fn remove_column(&mut self, column_id: &str) -> Result<Column> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?;
        for row in &mut self.rows {
            row.remove(column_id);
        }
        Ok(self.columns.remove(pos))
    }

    /// Append a row
    pub fn add_row(&mut self, row: Row) -> Result<()> {
        if self.row(&row.id).is_some() {
            return Err(Error::DuplicateRow(row.id));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Write a user value into a cell
    ///
    /// Formula and rollup columns are rejected: their value is always
    /// derived.
    pub fn set_cell(&mut self, row_id: &str, column_id: &str, value: CellValue) -> Result<()> {
        let column = self
            .column(column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?;
        if column.column_type.is_computed() {
            return Err(Error::ComputedColumn(column_id.to_string()));
        }
        let row = self
            .row_mut(row_id)
            .ok_or_else(|| Error::RowNotFound(row_id.to_string()))?;
        row.set(column_id, value);
        Ok(())
    }

    /// Find a column by id
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    /// Find a column by id (mutable)
    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }

    /// Find a column by exact, case-sensitive display name
    ///
    /// Names are not enforced unique; the first match wins.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Find a row by id
    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    /// Find a row by id (mutable)
    pub fn row_mut(&mut self, row_id: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == row_id)
    }

    /// Column references in column order
    pub fn column_refs(&self) -> Vec<ColumnRef<'_>> {
        self.columns
            .iter()
            .map(|c| ColumnRef {
                id: &c.id,
                name: &c.name,
                column_type: c.column_type,
            })
            .collect()
    }

    /// Formula and rollup columns
    pub fn computed_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|c| c.column_type.is_computed())
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowView;

    fn table() -> Table {
        let mut t = Table::new("t1", "Orders");
        t.add_column(Column::new("c1", "Price", ColumnType::Number)).unwrap();
        t.add_column(Column::formula("c2", "Total", "prop(\"Price\") * 2"))
            .unwrap();
        t.add_row(Row::new("r1").with_cell("c1", 10.0)).unwrap();
        t
    }

    #[test]
    fn test_lookup() {
        let t = table();
        assert_eq!(t.column("c1").unwrap().name, "Price");
        assert_eq!(t.column_by_name("Price").unwrap().id, "c1");
        assert!(t.column_by_name("price").is_none());
        assert!(t.row("r1").is_some());
        assert_eq!(t.computed_columns().count(), 1);

        let refs = t.column_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].column_type, ColumnType::Formula);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut t = table();
        assert!(matches!(
            t.add_column(Column::new("c1", "Other", ColumnType::Text)),
            Err(Error::DuplicateColumn(_))
        ));
        assert!(matches!(
            t.add_row(Row::new("r1")),
            Err(Error::DuplicateRow(_))
        ));
    }

    #[test]
    fn test_set_cell() {
        let mut t = table();
        t.set_cell("r1", "c1", CellValue::Number(12.0)).unwrap();
        assert_eq!(t.row("r1").unwrap().value("c1"), &CellValue::Number(12.0));

        assert!(matches!(
            t.set_cell("r1", "c2", CellValue::Number(1.0)),
            Err(Error::ComputedColumn(_))
        ));
        assert!(matches!(
            t.set_cell("nope", "c1", CellValue::Null),
            Err(Error::RowNotFound(_))
        ));
    }

    #[test]
    fn test_remove_column_drops_cells() {
        let mut t = table();
        let removed = t.remove_column("c1").unwrap();
        assert_eq!(removed.name, "Price");
        assert!(t.row("r1").unwrap().cell("c1").is_none());
        assert!(matches!(
            t.remove_column("c1"),
            Err(Error::ColumnNotFound(_))
        ));
    }
}
