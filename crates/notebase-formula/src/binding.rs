//! Rename-safe `prop` references
//!
//! A formula is saved with a map from each referenced name to the id of the
//! column that name meant at save time. After a column is renamed the
//! evaluator still finds it through the map, and the editor shows the
//! source with the current names.

use crate::parser::parse_formula;
use notebase_core::{Column, FormulaOptions};
use std::collections::BTreeMap;

/// Save-time binding of formula sources to column ids
pub trait FormulaBinding: Sized {
    /// Options for `source` with every resolvable `prop` name bound to its
    /// column id
    ///
    /// A source that does not parse is kept with no bindings; it evaluates
    /// to an error until fixed.
    fn bind(source: &str, columns: &[Column]) -> Self;

    /// The source with each bound reference spelled with its column's
    /// current name
    fn display_source(&self, columns: &[Column]) -> String;

    /// Re-save after renames: display source plus fresh bindings
    fn rebind(&self, columns: &[Column]) -> Self;
}

impl FormulaBinding for FormulaOptions {
    fn bind(source: &str, columns: &[Column]) -> Self {
        let mut references = BTreeMap::new();
        if let Ok(ast) = parse_formula(source) {
            for r in ast.property_refs() {
                if let Some(column) = columns.iter().find(|c| c.name == r.name) {
                    references.insert(r.name.clone(), column.id.clone());
                }
            }
        }
        FormulaOptions {
            source: source.to_string(),
            references,
        }
    }

    fn display_source(&self, columns: &[Column]) -> String {
        let ast = match parse_formula(&self.source) {
            Ok(ast) => ast,
            Err(_) => return self.source.clone(),
        };

        let mut out = String::with_capacity(self.source.len());
        let mut last = 0;
        for r in ast.property_refs() {
            let current_name = self
                .references
                .get(&r.name)
                .and_then(|id| columns.iter().find(|c| &c.id == id))
                .map(|c| c.name.as_str());
            match current_name {
                Some(name) if name != r.name => {
                    out.push_str(&self.source[last..r.span.start]);
                    out.push_str(&quote(name));
                    last = r.span.end;
                }
                _ => {}
            }
        }
        out.push_str(&self.source[last..]);
        out
    }

    fn rebind(&self, columns: &[Column]) -> Self {
        Self::bind(&self.display_source(columns), columns)
    }
}

/// Quote a column name as a formula string literal
pub fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
