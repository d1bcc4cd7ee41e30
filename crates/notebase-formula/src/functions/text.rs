//! Text functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

/// concat(a, ...) - display strings joined without a separator
pub fn fn_concat(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.as_string());
    }
    Ok(FormulaValue::Text(out))
}

/// length(t) - character count of the display string
pub fn fn_length(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args[0].as_string().chars().count();
    Ok(FormulaValue::Number(count as f64))
}
