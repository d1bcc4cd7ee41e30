//! Date functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

/// Display format of `now()`: month/day/year without padding
pub const NOW_FORMAT: &str = "%-m/%-d/%Y";

/// now() - current local date as text
///
/// The only volatile function. Tests fix the date with
/// [`EvaluationContext::with_today`].
pub fn fn_now(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Text(ctx.today().format(NOW_FORMAT).to_string()))
}
