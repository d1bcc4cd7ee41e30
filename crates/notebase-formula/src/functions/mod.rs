//! Built-in formula functions
//!
//! The function set is closed: formulas cannot define or load functions.
//! `if` is not listed here because it evaluates its branches lazily; the
//! evaluator handles it directly.

pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use ahash::AHashMap;

/// Function implementation signature
///
/// Arguments arrive evaluated. Functions can consult the evaluation context
/// (e.g. the date `now()` reports).
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (lowercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_text_functions();
        registry.register_logical_functions();
        registry.register_date_functions();

        registry
    }

    /// Look up a function by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_ascii_lowercase(), def);
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|f| f.name).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "sum",
            min_args: 0,
            max_args: None,
            implementation: math::fn_sum,
        });

        self.register(FunctionDef {
            name: "min",
            min_args: 1,
            max_args: None,
            implementation: math::fn_min,
        });

        self.register(FunctionDef {
            name: "max",
            min_args: 1,
            max_args: None,
            implementation: math::fn_max,
        });

        self.register(FunctionDef {
            name: "abs",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_abs,
        });

        self.register(FunctionDef {
            name: "round",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_round,
        });
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "concat",
            min_args: 0,
            max_args: None,
            implementation: text::fn_concat,
        });

        self.register(FunctionDef {
            name: "length",
            min_args: 1,
            max_args: Some(1),
            implementation: text::fn_length,
        });
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "empty",
            min_args: 1,
            max_args: Some(1),
            implementation: logical::fn_empty,
        });
    }

    fn register_date_functions(&mut self) {
        // Volatile: depends on the clock
        self.register(FunctionDef {
            name: "now",
            min_args: 0,
            max_args: Some(0),
            implementation: date::fn_now,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("SUM").is_some());
        assert!(registry.get("Concat").is_some());
        assert!(registry.get("if").is_none());
        assert!(registry.get("eval").is_none());
        assert_eq!(
            registry.names(),
            vec!["abs", "concat", "empty", "length", "max", "min", "now", "round", "sum"]
        );
    }
}
