//! Shared value coercions
//!
//! The formula evaluator, the rollup aggregator and the cell renderer all
//! convert cell values through these functions, so "is this a number" and
//! "is this empty" have exactly one answer across the engine.

use crate::cell::CellValue;
use chrono::{DateTime, SecondsFormat, Utc};

/// Convert a cell value to a number, if it has a numeric reading
///
/// - numbers convert as-is (non-finite numbers do not convert)
/// - text converts only when the whole trimmed string is a finite number
/// - booleans convert to 1 / 0
/// - null, lists and timestamps have no numeric reading
pub fn to_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_number(s),
        CellValue::Boolean(true) => Some(1.0),
        CellValue::Boolean(false) => Some(0.0),
        _ => None,
    }
}

/// Parse text that is entirely a finite number
///
/// Unlike a prefix parse, `"12abc"` is not a number. `"inf"` and `"NaN"`
/// are rejected as well.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Convert a cell value to the text shown in a table cell
pub fn to_display_string(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Boolean(b) => b.to_string(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Timestamp(ts) => format_timestamp(ts),
        CellValue::Text(s) => s.clone(),
        CellValue::List(items) => items.join(", "),
    }
}

/// Format a number for display
///
/// Integral values print without a fractional part; everything else uses the
/// shortest representation that parses back to the same `f64`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // also folds -0
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Format a timestamp for display (RFC 3339, UTC)
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Check whether a value counts as empty
///
/// Null, empty text and empty lists are empty. `0` and `false` are values.
pub fn is_empty(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Text(s) => s.is_empty(),
        CellValue::List(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&CellValue::Number(10.0)), Some(10.0));
        assert_eq!(to_number(&CellValue::text("7")), Some(7.0));
        assert_eq!(to_number(&CellValue::text(" 2.5 ")), Some(2.5));
        assert_eq!(to_number(&CellValue::text("1e3")), Some(1000.0));
        assert_eq!(to_number(&CellValue::Boolean(true)), Some(1.0));
        assert_eq!(to_number(&CellValue::Boolean(false)), Some(0.0));
        assert_eq!(to_number(&CellValue::Null), None);
        assert_eq!(to_number(&CellValue::text("")), None);
        assert_eq!(to_number(&CellValue::text("12abc")), None);
        assert_eq!(to_number(&CellValue::text("NaN")), None);
        assert_eq!(to_number(&CellValue::text("inf")), None);
        assert_eq!(to_number(&CellValue::Number(f64::NAN)), None);
        assert_eq!(to_number(&CellValue::list(["1"])), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(30.0), "30");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_to_display_string() {
        assert_eq!(to_display_string(&CellValue::Null), "");
        assert_eq!(to_display_string(&CellValue::Boolean(true)), "true");
        assert_eq!(to_display_string(&CellValue::text("Ada")), "Ada");
        assert_eq!(to_display_string(&CellValue::list(["a", "b"])), "a, b");

        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            to_display_string(&CellValue::Timestamp(ts)),
            "2024-03-01T12:30:00Z"
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&CellValue::Null));
        assert!(is_empty(&CellValue::text("")));
        assert!(is_empty(&CellValue::List(vec![])));
        assert!(!is_empty(&CellValue::text(" ")));
        assert!(!is_empty(&CellValue::Number(0.0)));
        assert!(!is_empty(&CellValue::Boolean(false)));
    }

    proptest! {
        #[test]
        fn display_round_trips_through_to_number(
            n in any::<f64>().prop_filter("finite", |n| n.is_finite())
        ) {
            let shown = to_display_string(&CellValue::Number(n));
            prop_assert_eq!(to_number(&CellValue::Text(shown)), Some(n));
        }

        #[test]
        fn integral_display_round_trips(n in -1_000_000_000i64..1_000_000_000i64) {
            let shown = to_display_string(&CellValue::Number(n as f64));
            prop_assert_eq!(shown.clone(), n.to_string());
            prop_assert_eq!(to_number(&CellValue::Text(shown)), Some(n as f64));
        }
    }
}
