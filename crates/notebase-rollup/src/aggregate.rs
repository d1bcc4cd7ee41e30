//! Aggregation operators

use crate::rollup::RollupOutcome;
use ahash::AHashSet;
use notebase_core::coerce;
use notebase_core::{Aggregation, CellValue};

/// Aggregate the target values of a row's related rows
///
/// `linked` is the number of linked row ids, which `count` reports even when
/// some of them point at rows that no longer exist. `values` holds one entry
/// per linked id, with select option ids already resolved to labels.
pub fn aggregate(aggregation: Aggregation, linked: usize, values: &[CellValue]) -> RollupOutcome {
    match aggregation {
        Aggregation::Count => RollupOutcome::Number(linked as f64),
        Aggregation::CountValues => {
            RollupOutcome::Number(non_empty(values).count() as f64)
        }
        Aggregation::CountUnique => {
            // 7 and "7" are different values
            let distinct: AHashSet<(&str, String)> = non_empty(values)
                .map(|v| (v.type_name(), coerce::to_display_string(v)))
                .collect();
            RollupOutcome::Number(distinct.len() as f64)
        }
        // `Iterator::sum` starts from -0.0
        Aggregation::Sum => finite(numbers(values).fold(0.0, |t, n| t + n)),
        Aggregation::Average => {
            let (count, total) = numbers(values).fold((0usize, 0.0), |(c, t), n| (c + 1, t + n));
            if count == 0 {
                RollupOutcome::Empty
            } else {
                finite(total / count as f64)
            }
        }
        Aggregation::Min => numbers(values)
            .reduce(f64::min)
            .map_or(RollupOutcome::Empty, RollupOutcome::Number),
        Aggregation::Max => numbers(values)
            .reduce(f64::max)
            .map_or(RollupOutcome::Empty, RollupOutcome::Number),
        Aggregation::ShowOriginal => {
            let shown: Vec<String> = non_empty(values).map(coerce::to_display_string).collect();
            if shown.is_empty() {
                RollupOutcome::Empty
            } else {
                RollupOutcome::Text(shown.join(", "))
            }
        }
    }
}

/// Overflowed totals show as empty rather than "inf"
fn finite(n: f64) -> RollupOutcome {
    if n.is_finite() {
        RollupOutcome::Number(n)
    } else {
        RollupOutcome::Empty
    }
}

fn non_empty(values: &[CellValue]) -> impl Iterator<Item = &CellValue> + '_ {
    values.iter().filter(|v| !coerce::is_empty(v))
}

/// Values with a numeric reading; everything else is skipped
fn numbers(values: &[CellValue]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(coerce::to_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values() -> Vec<CellValue> {
        vec![
            CellValue::Number(5.0),
            CellValue::Null,
            CellValue::text("7"),
            CellValue::Number(7.0),
            CellValue::text(""),
            CellValue::text("n/a"),
        ]
    }

    #[test]
    fn test_counts() {
        let values = values();
        assert_eq!(aggregate(Aggregation::Count, 6, &values), RollupOutcome::Number(6.0));
        assert_eq!(
            aggregate(Aggregation::CountValues, 6, &values),
            RollupOutcome::Number(4.0)
        );
        assert_eq!(
            aggregate(Aggregation::CountUnique, 6, &values),
            RollupOutcome::Number(4.0)
        );
    }

    #[test]
    fn test_count_unique_by_kind_and_display() {
        let values = vec![
            CellValue::text("a"),
            CellValue::text("a"),
            CellValue::Boolean(true),
            CellValue::text("true"),
            CellValue::Null,
            CellValue::Null,
        ];
        assert_eq!(
            aggregate(Aggregation::CountUnique, 6, &values),
            RollupOutcome::Number(3.0)
        );
    }

    #[test]
    fn test_sum_skips_non_numbers() {
        let values = vec![CellValue::Number(5.0), CellValue::Null, CellValue::text("7")];
        assert_eq!(aggregate(Aggregation::Sum, 3, &values), RollupOutcome::Number(12.0));
        assert_eq!(aggregate(Aggregation::Sum, 0, &[]), RollupOutcome::Number(0.0));
        assert_eq!(
            aggregate(Aggregation::Sum, 2, &[CellValue::Boolean(true), CellValue::Boolean(true)]),
            RollupOutcome::Number(2.0)
        );
    }

    #[test]
    fn test_sum_of_nothing_is_positive_zero() {
        for values in [vec![], vec![CellValue::Null, CellValue::text("x")]] {
            match aggregate(Aggregation::Sum, values.len(), &values) {
                RollupOutcome::Number(n) => {
                    assert_eq!(n, 0.0);
                    assert!(n.is_sign_positive());
                }
                other => panic!("expected a number, got {:?}", other),
            }
        }
        assert_eq!(aggregate(Aggregation::Sum, 0, &[]).display(), "0");
    }

    #[test]
    fn test_overflow_is_empty() {
        let huge = vec![CellValue::Number(1e308), CellValue::Number(1e308)];
        assert_eq!(aggregate(Aggregation::Sum, 2, &huge), RollupOutcome::Empty);
        assert_eq!(aggregate(Aggregation::Average, 2, &huge), RollupOutcome::Empty);
        assert_eq!(aggregate(Aggregation::Max, 2, &huge), RollupOutcome::Number(1e308));
    }

    #[test]
    fn test_average_min_max() {
        let values = values();
        assert_eq!(
            aggregate(Aggregation::Average, 6, &values),
            RollupOutcome::Number(19.0 / 3.0)
        );
        assert_eq!(aggregate(Aggregation::Min, 6, &values), RollupOutcome::Number(5.0));
        assert_eq!(aggregate(Aggregation::Max, 6, &values), RollupOutcome::Number(7.0));
    }

    #[test]
    fn test_empty_sets() {
        let nothing = vec![CellValue::Null, CellValue::text("x")];
        assert_eq!(aggregate(Aggregation::Average, 2, &nothing), RollupOutcome::Empty);
        assert_eq!(aggregate(Aggregation::Min, 2, &nothing), RollupOutcome::Empty);
        assert_eq!(aggregate(Aggregation::Max, 2, &nothing), RollupOutcome::Empty);
        assert_eq!(
            aggregate(Aggregation::ShowOriginal, 1, &[CellValue::Null]),
            RollupOutcome::Empty
        );
    }

    #[test]
    fn test_show_original() {
        let values = vec![
            CellValue::text("Design"),
            CellValue::Null,
            CellValue::Number(3.0),
            CellValue::list(["a", "b"]),
        ];
        assert_eq!(
            aggregate(Aggregation::ShowOriginal, 4, &values),
            RollupOutcome::Text("Design, 3, a, b".into())
        );
    }
}
