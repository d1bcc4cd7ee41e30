//! Math functions

use crate::error::FormulaResult;
use crate::evaluator::{finite, EvaluationContext, FormulaValue};

fn numbers(args: &[FormulaValue]) -> FormulaResult<Vec<f64>> {
    args.iter().map(FormulaValue::to_number).collect()
}

/// sum(a, ...) - 0 when called without arguments
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finite(numbers(args)?.into_iter().sum())
}

/// min(a, ...)
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let min = numbers(args)?.into_iter().fold(f64::INFINITY, f64::min);
    finite(min)
}

/// max(a, ...)
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let max = numbers(args)?.into_iter().fold(f64::NEG_INFINITY, f64::max);
    finite(max)
}

/// abs(n)
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(args[0].to_number()?.abs()))
}

/// round(n, [digits])
///
/// Rounds half away from zero. Negative digits round to tens, hundreds, ...
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = args[0].to_number()?;
    let digits = match args.get(1) {
        Some(v) => v.to_number()?.trunc(),
        None => 0.0,
    };

    // f64 carries ~15 significant decimal digits
    if digits > 15.0 {
        return Ok(FormulaValue::Number(number));
    }
    let digits = digits.max(-15.0) as i32;

    let multiplier = 10f64.powi(digits);
    let scaled = number * multiplier;
    if !scaled.is_finite() {
        // too large to carry that many decimals
        return Ok(FormulaValue::Number(number));
    }
    finite(scaled.round() / multiplier)
}
