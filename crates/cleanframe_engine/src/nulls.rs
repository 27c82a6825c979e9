//! Null handling and pattern validation.
//!
//! This stage runs first for every column, before type coercion, so pattern
//! checks see the values as they arrived rather than their coerced form.

use crate::{CleanError, DropMask};
use cleanframe_core::{ColumnRule, FillStrategy, FillValue, Report, Table, Value};
use regex::Regex;
use std::cmp::Ordering;

/// Fills or drops nulls, then checks values against the column pattern.
pub fn handle_null_and_pattern(
    table: &mut Table,
    column: &str,
    rule: &ColumnRule,
    report: &mut Report,
) -> DropMask {
    let mut mask = DropMask::new(table.len());

    if !rule.allow_null {
        mask = mask.union(&handle_nulls(table, column, rule, report));
    }

    if let Some(pattern) = &rule.pattern {
        mask = mask.union(&handle_pattern(table, column, rule, pattern, report));
    }

    mask
}

fn handle_nulls(table: &mut Table, column: &str, rule: &ColumnRule, report: &mut Report) -> DropMask {
    let Some(col) = table.column_mut(column) else {
        return DropMask::new(0);
    };

    let nulls: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter_map(|(position, value)| value.is_null().then_some(position))
        .collect();
    if nulls.is_empty() {
        return DropMask::new(col.len());
    }

    if rule.drop_if_invalid {
        report.warn(format!(
            "{} null(s) in '{}' marked for drop.",
            nulls.len(),
            column
        ));
        return DropMask::from_positions(col.len(), &nulls);
    }

    let (fill, label) = match &rule.fill_value {
        None => (Value::Null, "none"),
        Some(FillValue::Literal(value)) => (value.clone(), "literal"),
        Some(FillValue::Strategy(strategy)) => match compute_fill(*strategy, col.values()) {
            Ok(value) => (value, strategy.as_str()),
            Err(err) => {
                report.error(format!(
                    "Could not compute {} for '{}': {}. Nulls left unfilled.",
                    strategy, column, err
                ));
                return DropMask::new(col.len());
            }
        },
    };

    for &position in &nulls {
        col.set(position, fill.clone());
    }
    report.info(format!(
        "Filled {} null(s) in '{}' with {} (strategy={}).",
        nulls.len(),
        column,
        fill,
        label
    ));

    DropMask::new(col.len())
}

/// Computes a fill aggregate over the non-null values of a column.
///
/// Mean and median need numeric values; min and max need mutually comparable
/// values. Results over integer-only columns stay integers when integral.
pub fn compute_fill(strategy: FillStrategy, values: &[Value]) -> Result<Value, CleanError> {
    let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if present.is_empty() {
        return Err(CleanError::aggregate("column has no non-null values"));
    }

    match strategy {
        FillStrategy::Mean | FillStrategy::Median => {
            let mut numbers = Vec::with_capacity(present.len());
            for value in &present {
                let number = value.as_float().ok_or_else(|| {
                    CleanError::aggregate(format!(
                        "non-numeric value '{}' ({})",
                        value,
                        value.type_name()
                    ))
                })?;
                numbers.push(number);
            }

            let result = if strategy == FillStrategy::Mean {
                numbers.iter().sum::<f64>() / numbers.len() as f64
            } else {
                numbers.sort_by(f64::total_cmp);
                let mid = numbers.len() / 2;
                if numbers.len() % 2 == 0 {
                    (numbers[mid - 1] + numbers[mid]) / 2.0
                } else {
                    numbers[mid]
                }
            };

            let integers = present.iter().all(|v| matches!(v, Value::Int(_)));
            if integers && result.fract() == 0.0 {
                Ok(Value::Int(result as i64))
            } else {
                Ok(Value::Float(result))
            }
        }
        FillStrategy::Min | FillStrategy::Max => {
            let wanted = if strategy == FillStrategy::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best = present[0];
            for value in &present[1..] {
                match value.compare(best) {
                    Some(ordering) if ordering == wanted => best = value,
                    Some(_) => {}
                    None => {
                        return Err(CleanError::aggregate(format!(
                            "values '{}' ({}) and '{}' ({}) are not comparable",
                            best,
                            best.type_name(),
                            value,
                            value.type_name()
                        )));
                    }
                }
            }
            Ok(best.clone())
        }
    }
}

fn handle_pattern(
    table: &mut Table,
    column: &str,
    rule: &ColumnRule,
    pattern: &str,
    report: &mut Report,
) -> DropMask {
    let Some(col) = table.column_mut(column) else {
        return DropMask::new(0);
    };

    let regex = match compile_full_match(pattern) {
        Ok(regex) => regex,
        Err(err) => {
            report.error(format!(
                "Invalid pattern for '{}': {}. Pattern check skipped.",
                column, err
            ));
            return DropMask::new(col.len());
        }
    };

    // Nulls always match; null policy belongs to null handling.
    let failing: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.is_null() && !regex.is_match(&value.to_string()))
        .map(|(position, _)| position)
        .collect();
    if failing.is_empty() {
        return DropMask::new(col.len());
    }

    if rule.drop_if_invalid {
        report.warn(format!(
            "{} value(s) in '{}' failing pattern marked for drop.",
            failing.len(),
            column
        ));
        return DropMask::from_positions(col.len(), &failing);
    }

    let fill = rule.fill_literal();
    for &position in &failing {
        col.set(position, fill.clone());
    }
    report.info(format!(
        "Replaced {} value(s) in '{}' failing pattern with {}.",
        failing.len(),
        column,
        fill
    ));

    DropMask::new(col.len())
}

/// Compiles `pattern` so that it must match a whole value.
pub fn compile_full_match(pattern: &str) -> Result<Regex, CleanError> {
    Regex::new(pattern)?;
    Ok(Regex::new(&format!(r"\A(?:{})\z", pattern))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanframe_core::{ColumnRuleBuilder, Level};
    use pretty_assertions::assert_eq;

    fn table(values: Vec<Value>) -> Table {
        Table::from_columns(vec![("col", values)]).expect("valid table")
    }

    fn values(table: &Table) -> Vec<Value> {
        table.column("col").map(|c| c.values().to_vec()).unwrap_or_default()
    }

    #[test]
    fn test_nulls_allowed_is_noop() {
        let mut t = table(vec![Value::Null, Value::Int(1)]);
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &ColumnRule::default(), &mut report);
        assert!(!mask.any());
        assert!(report.is_empty());
    }

    #[test]
    fn test_nulls_marked_for_drop() {
        let mut t = table(vec![Value::Null, Value::Int(1), Value::Float(f64::NAN)]);
        let rule = ColumnRuleBuilder::new()
            .allow_null(false)
            .drop_if_invalid(true)
            .build();
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert_eq!(mask.as_slice(), &[true, false, true]);
        assert_eq!(report.messages(), vec!["2 null(s) in 'col' marked for drop."]);
        assert_eq!(report.entries()[0].level, Level::Warning);
    }

    #[test]
    fn test_nulls_filled_with_literal() {
        let mut t = table(vec!["Ann".into(), Value::Null]);
        let rule = ColumnRuleBuilder::new()
            .allow_null(false)
            .fill_value(Value::from("Unknown"))
            .build();
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert!(!mask.any());
        assert_eq!(values(&t), vec![Value::from("Ann"), Value::from("Unknown")]);
        assert_eq!(
            report.messages(),
            vec!["Filled 1 null(s) in 'col' with Unknown (strategy=literal)."]
        );
    }

    #[test]
    fn test_nulls_filled_with_median() {
        let mut t = table(vec![Value::Int(10), Value::Null, Value::Int(30), Value::Int(20)]);
        let rule = ColumnRuleBuilder::new()
            .allow_null(false)
            .fill_value(FillStrategy::Median)
            .build();
        let mut report = Report::new();
        handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert_eq!(values(&t)[1], Value::Int(20));
        assert!(report.contains("strategy=median"));
    }

    #[test]
    fn test_mean_of_text_column_is_reported() {
        let mut t = table(vec!["a".into(), Value::Null]);
        let rule = ColumnRuleBuilder::new()
            .allow_null(false)
            .fill_value(FillStrategy::Mean)
            .build();
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert!(!mask.any());
        assert_eq!(values(&t)[1], Value::Null);
        assert!(report.has_errors());
        assert!(report.contains("Could not compute mean for 'col'"));
        assert!(report.contains("Nulls left unfilled."));
    }

    #[test]
    fn test_compute_fill() {
        let values = vec![Value::Int(3), Value::Float(1.5), Value::Null, Value::Int(4)];
        assert_eq!(
            compute_fill(FillStrategy::Mean, &values).unwrap(),
            Value::Float(8.5 / 3.0)
        );
        assert_eq!(
            compute_fill(FillStrategy::Median, &values).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(compute_fill(FillStrategy::Min, &values).unwrap(), Value::Float(1.5));
        assert_eq!(compute_fill(FillStrategy::Max, &values).unwrap(), Value::Int(4));

        let words = vec![Value::from("pear"), Value::from("apple")];
        assert_eq!(
            compute_fill(FillStrategy::Min, &words).unwrap(),
            Value::from("apple")
        );
        assert!(compute_fill(FillStrategy::Max, &[Value::Null]).is_err());
        assert!(compute_fill(FillStrategy::Min, &[Value::Int(1), Value::from("a")]).is_err());
    }

    #[test]
    fn test_pattern_replaces_with_null_by_default() {
        let mut t = table(vec!["12345".into(), "abcde".into(), "67890".into()]);
        let rule = ColumnRuleBuilder::new().pattern(r"^\d{5}$").build();
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert!(!mask.any());
        assert_eq!(
            values(&t),
            vec![Value::from("12345"), Value::Null, Value::from("67890")]
        );
        assert_eq!(
            report.messages(),
            vec!["Replaced 1 value(s) in 'col' failing pattern with null."]
        );
    }

    #[test]
    fn test_pattern_must_match_whole_value() {
        let mut t = table(vec!["ab12".into(), "12".into(), Value::Null, Value::Int(34)]);
        let rule = ColumnRuleBuilder::new()
            .pattern(r"\d+")
            .drop_if_invalid(true)
            .build();
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert_eq!(mask.as_slice(), &[true, false, false, false]);
        assert!(report.contains("1 value(s) in 'col' failing pattern marked for drop."));
    }

    #[test]
    fn test_pattern_alternation_is_anchored() {
        let regex = compile_full_match("cat|dog").unwrap();
        assert!(regex.is_match("dog"));
        assert!(!regex.is_match("hotdog"));
        assert!(!regex.is_match("category"));
    }

    #[test]
    fn test_malformed_pattern_skips_check() {
        let mut t = table(vec!["x".into()]);
        let rule = ColumnRuleBuilder::new()
            .pattern("[a-")
            .drop_if_invalid(true)
            .build();
        let mut report = Report::new();
        let mask = handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert!(!mask.any());
        assert_eq!(values(&t), vec![Value::from("x")]);
        assert!(report.has_errors());
        assert!(report.contains("Invalid pattern for 'col'"));
    }

    #[test]
    fn test_filled_nulls_then_checked_against_pattern() {
        let mut t = table(vec![Value::Null, "AB".into()]);
        let rule = ColumnRuleBuilder::new()
            .allow_null(false)
            .fill_value(Value::from("??"))
            .pattern("[A-Z]{2}")
            .drop_if_invalid(false)
            .build();
        let mut report = Report::new();
        handle_null_and_pattern(&mut t, "col", &rule, &mut report);
        assert_eq!(values(&t), vec![Value::from("??"), Value::from("AB")]);
        assert_eq!(report.len(), 2);
        assert!(report.contains("Replaced 1 value(s) in 'col' failing pattern with ??."));
    }
}
