//! Access to related tables

use crate::error::FetchError;
use notebase_core::{Table, Workspace};
use std::borrow::Cow;
use std::collections::HashMap;

/// Read-only source of related tables
///
/// Implemented by whatever owns the workspace's storage. `Ok(None)` means the
/// table does not exist (for example it was deleted).
pub trait RelatedTableFetcher {
    /// Fetch a table's schema and rows by id
    fn fetch_table(&self, table_id: &str) -> Result<Option<Cow<'_, Table>>, FetchError>;
}

impl RelatedTableFetcher for Workspace {
    fn fetch_table(&self, table_id: &str) -> Result<Option<Cow<'_, Table>>, FetchError> {
        Ok(self.table(table_id).map(Cow::Borrowed))
    }
}

impl RelatedTableFetcher for HashMap<String, Table> {
    fn fetch_table(&self, table_id: &str) -> Result<Option<Cow<'_, Table>>, FetchError> {
        Ok(self.get(table_id).map(Cow::Borrowed))
    }
}

impl<T: RelatedTableFetcher + ?Sized> RelatedTableFetcher for &T {
    fn fetch_table(&self, table_id: &str) -> Result<Option<Cow<'_, Table>>, FetchError> {
        (**self).fetch_table(table_id)
    }
}

/// Fetcher backed by a closure
///
/// Created with [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F>(F);

/// Wrap a closure as a fetcher
///
/// # Example
/// ```rust
/// use notebase_core::Table;
/// use notebase_rollup::{from_fn, RelatedTableFetcher};
///
/// let fetcher = from_fn(|id: &str| Ok((id == "tasks").then(|| Table::new("tasks", "Tasks"))));
/// assert!(fetcher.fetch_table("tasks").unwrap().is_some());
/// assert!(fetcher.fetch_table("other").unwrap().is_none());
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&str) -> Result<Option<Table>, FetchError>,
{
    FromFn(f)
}

impl<F> RelatedTableFetcher for FromFn<F>
where
    F: Fn(&str) -> Result<Option<Table>, FetchError>,
{
    fn fetch_table(&self, table_id: &str) -> Result<Option<Cow<'_, Table>>, FetchError> {
        Ok((self.0)(table_id)?.map(Cow::Owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_fetcher() {
        let mut ws = Workspace::new();
        ws.add_table(Table::new("t1", "Tasks")).unwrap();

        let table = ws.fetch_table("t1").unwrap().unwrap();
        assert!(matches!(table, Cow::Borrowed(_)));
        assert_eq!(table.name, "Tasks");
        assert!(ws.fetch_table("t2").unwrap().is_none());
    }

    #[test]
    fn test_map_fetcher() {
        let mut tables = HashMap::new();
        tables.insert("t1".to_string(), Table::new("t1", "Tasks"));
        assert!(tables.fetch_table("t1").unwrap().is_some());
        assert!((&tables).fetch_table("t2").unwrap().is_none());
    }

    #[test]
    fn test_closure_fetcher_errors() {
        let fetcher = from_fn(|id: &str| Err(FetchError::unavailable(id, "offline")));
        assert_eq!(
            fetcher.fetch_table("t1").unwrap_err().to_string(),
            "table t1 is unavailable: offline"
        );
    }
}
