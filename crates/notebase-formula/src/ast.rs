//! Formula Abstract Syntax Tree types

use std::ops::Range;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),

    // === References ===
    /// `prop("Column name")`
    PropertyRef(PropertyRef),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    /// Function call; `name` is lowercase. `if` is evaluated lazily.
    Function { name: String, args: Vec<FormulaExpr> },
}

impl FormulaExpr {
    /// All property references, in source order
    pub fn property_refs(&self) -> Vec<&PropertyRef> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a PropertyRef>) {
        match self {
            FormulaExpr::PropertyRef(r) => out.push(r),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_refs(out);
                right.collect_refs(out);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_refs(out),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_refs(out);
                }
            }
            FormulaExpr::Number(_) | FormulaExpr::String(_) | FormulaExpr::Boolean(_) => {}
        }
    }
}

/// A `prop(...)` reference
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRef {
    /// Column display name as written
    pub name: String,
    /// Byte range of the quoted name in the source, quotes included
    pub span: Range<usize>,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Source symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}
