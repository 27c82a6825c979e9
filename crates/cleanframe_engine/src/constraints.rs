//! Range and membership constraints.
//!
//! The three checks run one after another against the column as it stands,
//! so a value clamped to `min` is then checked against `max` in its clamped
//! form.

use crate::{CleanError, DropMask, parse_timestamp};
use cleanframe_core::{ColumnRule, Report, Table, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Bound {
    Min,
    Max,
}

impl Bound {
    fn label(self) -> &'static str {
        match self {
            Bound::Min => "below min",
            Bound::Max => "above max",
        }
    }

    fn violated_by(self, ordering: Ordering) -> bool {
        match self {
            Bound::Min => ordering == Ordering::Less,
            Bound::Max => ordering == Ordering::Greater,
        }
    }
}

/// Applies `min`, `max` and `allowed_values`, in that order.
pub fn apply_constraints(
    table: &mut Table,
    column: &str,
    rule: &ColumnRule,
    report: &mut Report,
) -> DropMask {
    let mut mask = DropMask::new(table.len());

    if let Some(min) = &rule.min {
        mask = mask.union(&check_bound(table, column, rule, Bound::Min, min, report));
    }
    if let Some(max) = &rule.max {
        mask = mask.union(&check_bound(table, column, rule, Bound::Max, max, report));
    }
    if let Some(allowed) = &rule.allowed_values {
        mask = mask.union(&check_allowed(table, column, rule, allowed, report));
    }

    mask
}

fn check_bound(
    table: &mut Table,
    column: &str,
    rule: &ColumnRule,
    bound: Bound,
    limit: &Value,
    report: &mut Report,
) -> DropMask {
    let len = table.len();
    let Some(col) = table.column_mut(column) else {
        return DropMask::new(len);
    };

    let limit = align_bound(limit, col.values());
    let mut violations = Vec::new();
    for (position, value) in col.values().iter().enumerate() {
        if value.is_null() {
            continue;
        }
        match value.compare(&limit) {
            Some(ordering) if bound.violated_by(ordering) => violations.push(position),
            Some(_) => {}
            None => {
                let err = CleanError::Incomparable {
                    value: value.to_string(),
                    value_type: value.type_name(),
                    bound: limit.to_string(),
                    bound_type: limit.type_name(),
                };
                report.error(format!(
                    "Cannot compare '{}' against {}: {}. Check skipped.",
                    column, limit, err
                ));
                return DropMask::new(len);
            }
        }
    }

    if violations.is_empty() {
        return DropMask::new(len);
    }

    if rule.drop_if_invalid {
        report.warn(format!(
            "{} value(s) in '{}' {} marked for drop.",
            violations.len(),
            column,
            bound.label()
        ));
        return DropMask::from_positions(len, &violations);
    }

    for &position in &violations {
        col.set(position, limit.clone().into_owned());
    }
    report.info(format!(
        "Replaced {} value(s) in '{}' {} with {}.",
        violations.len(),
        column,
        bound.label(),
        limit
    ));

    DropMask::new(len)
}

/// Reads a text bound or allowed value as a timestamp when the column holds timestamps.
fn align_bound<'a>(limit: &'a Value, values: &[Value]) -> Cow<'a, Value> {
    let holds_timestamps = values
        .iter()
        .find(|v| !v.is_null())
        .is_some_and(|v| v.as_timestamp().is_some());

    match limit.as_str().filter(|_| holds_timestamps).and_then(parse_timestamp) {
        Some(ts) => Cow::Owned(Value::Timestamp(ts)),
        None => Cow::Borrowed(limit),
    }
}

fn check_allowed(
    table: &mut Table,
    column: &str,
    rule: &ColumnRule,
    allowed: &[Value],
    report: &mut Report,
) -> DropMask {
    let len = table.len();
    let Some(col) = table.column_mut(column) else {
        return DropMask::new(len);
    };

    let allowed: Vec<Cow<'_, Value>> = allowed
        .iter()
        .map(|a| align_bound(a, col.values()))
        .collect();
    let is_allowed = |value: &Value| allowed.iter().any(|a| a.loose_eq(value));
    let disallowed: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.is_null() && !is_allowed(value))
        .map(|(position, _)| position)
        .collect();

    let mut mask = DropMask::new(len);
    if !disallowed.is_empty() {
        if rule.drop_if_invalid {
            report.warn(format!(
                "{} disallowed value(s) in '{}' marked for drop.",
                disallowed.len(),
                column
            ));
            mask = DropMask::from_positions(len, &disallowed);
        } else {
            let fill = rule.fill_literal();
            for &position in &disallowed {
                col.set(position, fill.clone());
            }
            report.info(format!(
                "Replaced {} disallowed value(s) in '{}' with {}.",
                disallowed.len(),
                column,
                fill
            ));
        }
    }

    // The domain keeps declaration order and drops categories no longer present.
    let domain: Vec<Value> = allowed
        .iter()
        .filter(|category| col.values().iter().any(|v| v.loose_eq(category)))
        .map(|category| category.clone().into_owned())
        .collect();
    col.set_categories(Some(domain));

    mask
}
