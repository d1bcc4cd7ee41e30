//! Workspace: the set of tables a rollup can reach

use crate::error::{Error, Result};
use crate::table::Table;

/// A snapshot of every table in a workspace
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Workspace {
    #[cfg_attr(feature = "serde", serde(default))]
    tables: Vec<Table>,
}

impl Workspace {
    /// Create an empty workspace
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.table(&table.id).is_some() {
            return Err(Error::DuplicateTable(table.id));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Remove a table by id
    pub fn remove_table(&mut self, table_id: &str) -> Result<Table> {
        let pos = self
            .tables
            .iter()
            .position(|t| t.id == table_id)
            .ok_or_else(|| Error::TableNotFound(table_id.to_string()))?;
        Ok(self.tables.remove(pos))
    }

    /// Find a table by id
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    /// Find a table by id (mutable)
    pub fn table_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == table_id)
    }

    /// Find a table by id, falling back to its display name
    pub fn find_table(&self, id_or_name: &str) -> Option<&Table> {
        self.table(id_or_name)
            .or_else(|| self.tables.iter().find(|t| t.name == id_or_name))
    }

    /// All tables
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_find() {
        let mut ws = Workspace::new();
        ws.add_table(Table::new("t1", "Projects")).unwrap();
        ws.add_table(Table::new("t2", "Tasks")).unwrap();

        assert_eq!(ws.table_count(), 2);
        assert_eq!(ws.table("t2").unwrap().name, "Tasks");
        assert_eq!(ws.find_table("Projects").unwrap().id, "t1");
        assert!(ws.find_table("Nope").is_none());
        assert!(matches!(
            ws.add_table(Table::new("t1", "Again")),
            Err(Error::DuplicateTable(_))
        ));
    }

    #[test]
    fn test_remove_table() {
        let mut ws = Workspace::new();
        ws.add_table(Table::new("t1", "Projects")).unwrap();
        ws.remove_table("t1").unwrap();
        assert!(ws.table("t1").is_none());
        assert!(matches!(
            ws.remove_table("t1"),
            Err(Error::TableNotFound(_))
        ));
    }
}
