//! Dependency tracking between computed columns

use crate::evaluator::resolve_column;
use crate::parser::parse_formula;
use ahash::{AHashMap, AHashSet};
use notebase_core::{Column, ColumnType};

/// Dependency graph for the computed columns of one table
///
/// A formula column depends on every column its `prop` references resolve
/// to; a rollup column depends on its relation column. Nodes are column ids.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Column → columns that depend on it (dependents)
    dependents: AHashMap<String, AHashSet<String>>,
    /// Column → columns it depends on (precedents)
    precedents: AHashMap<String, AHashSet<String>>,
    /// Computed columns in table order
    computed: Vec<String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a table's columns
    ///
    /// Formula sources that fail to parse and references that resolve to no
    /// column contribute no edges.
    pub fn from_columns(columns: &[Column]) -> Self {
        let mut graph = Self::new();

        for column in columns {
            match column.column_type {
                ColumnType::Formula => {
                    graph.computed.push(column.id.clone());
                    let opts = match column.formula_options() {
                        Some(opts) if opts.has_valid_config() => opts,
                        _ => continue,
                    };
                    let ast = match parse_formula(&opts.source) {
                        Ok(ast) => ast,
                        Err(_) => continue,
                    };
                    for r in ast.property_refs() {
                        let target = resolve_column(columns, Some(&opts.references), &r.name);
                        if let Some(target) = target {
                            graph.add_dependency(&target.id, &column.id);
                        }
                    }
                }
                ColumnType::Rollup => {
                    graph.computed.push(column.id.clone());
                    if let Some(relation_id) = column
                        .rollup_options()
                        .and_then(|opts| opts.relation_column_id.as_deref())
                    {
                        graph.add_dependency(relation_id, &column.id);
                    }
                }
                _ => {}
            }
        }

        graph
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Remove all dependencies of a column
    pub fn clear_dependencies(&mut self, column_id: &str) {
        // Remove from all precedents' dependents list
        if let Some(precedents) = self.precedents.remove(column_id) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(column_id);
                }
            }
        }

        // Remove as a precedent for others
        if let Some(dependents) = self.dependents.remove(column_id) {
            for dependent in dependents {
                if let Some(precs) = self.precedents.get_mut(&dependent) {
                    precs.remove(column_id);
                }
            }
        }
    }

    /// Columns that depend directly on the given column, sorted
    pub fn dependents(&self, column_id: &str) -> Vec<&str> {
        sorted(self.dependents.get(column_id))
    }

    /// Columns the given column depends on directly, sorted
    pub fn precedents(&self, column_id: &str) -> Vec<&str> {
        sorted(self.precedents.get(column_id))
    }

    /// Every column whose value changes when the given column changes
    ///
    /// Useful before deleting or retyping a column.
    pub fn affected_by(&self, column_id: &str) -> Vec<String> {
        let mut seen = AHashSet::new();
        let mut stack = vec![column_id];
        while let Some(current) = stack.pop() {
            for dependent in self.dependents(current) {
                if seen.insert(dependent) {
                    stack.push(dependent);
                }
            }
        }
        let mut result: Vec<String> = seen.into_iter().map(str::to_string).collect();
        result.sort();
        result
    }

    /// Check whether a column reaches itself through its precedents
    pub fn has_circular_reference(&self, column_id: &str) -> bool {
        let mut visited = AHashSet::new();
        let mut stack = self.precedents(column_id);
        while let Some(current) = stack.pop() {
            if current == column_id {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.precedents(current));
            }
        }
        false
    }

    /// Computed columns that sit on a cycle, in table order
    pub fn circular_columns(&self) -> Vec<String> {
        self.computed
            .iter()
            .filter(|id| self.has_circular_reference(id))
            .cloned()
            .collect()
    }

    /// Computed columns ordered so that every column comes after the
    /// computed columns it depends on
    ///
    /// Columns on a cycle are left out.
    pub fn evaluation_order(&self) -> Vec<String> {
        let circular: AHashSet<String> = self.circular_columns().into_iter().collect();
        let computed: AHashSet<&str> = self.computed.iter().map(String::as_str).collect();
        let mut result = Vec::new();
        let mut visited = AHashSet::new();

        for id in &self.computed {
            self.topological_sort(id, &computed, &circular, &mut visited, &mut result);
        }

        result
    }

    /// Topological sort helper (DFS, precedents first)
    fn topological_sort<'g>(
        &'g self,
        column_id: &'g str,
        computed: &AHashSet<&str>,
        circular: &AHashSet<String>,
        visited: &mut AHashSet<&'g str>,
        result: &mut Vec<String>,
    ) {
        if circular.contains(column_id) || !visited.insert(column_id) {
            return;
        }

        for precedent in self.precedents(column_id) {
            self.topological_sort(precedent, computed, circular, visited, result);
        }

        if computed.contains(column_id) {
            result.push(column_id.to_string());
        }
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
        self.computed.clear();
    }
}

fn sorted(set: Option<&AHashSet<String>>) -> Vec<&str> {
    let mut items: Vec<&str> = set
        .into_iter()
        .flat_map(|s| s.iter().map(String::as_str))
        .collect();
    items.sort_unstable();
    items
}
