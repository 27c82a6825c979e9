//! Type coercion.
//!
//! Values that cannot be converted become null instead of failing the column.
//! A value that was present before coercion and is null afterwards is a new
//! invalid; nulls that were already there are not counted.

use crate::{CleanError, DropMask};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use cleanframe_core::{ColumnRule, DType, Report, TIMESTAMP_FORMAT, Table, Value};
use std::cmp::Ordering;

/// Coerces a column toward `rule.dtype`.
pub fn coerce(table: &mut Table, column: &str, rule: &ColumnRule, report: &mut Report) -> DropMask {
    let len = table.len();
    let Some(dtype) = rule.dtype else {
        return DropMask::new(len);
    };
    let Some(col) = table.column_mut(column) else {
        return DropMask::new(len);
    };

    if dtype == DType::Category {
        col.set_categories(Some(category_domain(col.values())));
        return DropMask::new(len);
    }

    let converted = match convert_column(col.values(), dtype) {
        Ok(converted) => converted,
        Err(err) => {
            report.error(format!(
                "Failed type conversion for column '{}': {}",
                column, err
            ));
            return DropMask::new(len);
        }
    };

    let invalid: Vec<usize> = col
        .values()
        .iter()
        .zip(&converted)
        .enumerate()
        .filter_map(|(position, (before, after))| {
            (!before.is_null() && after.is_null()).then_some(position)
        })
        .collect();

    col.replace_values(converted);
    col.set_categories(None);

    if invalid.is_empty() {
        return DropMask::new(len);
    }

    if rule.drop_if_invalid {
        report.warn(format!(
            "{} invalid type(s) in '{}' marked for drop.",
            invalid.len(),
            column
        ));
        DropMask::from_positions(len, &invalid)
    } else {
        report.info(format!(
            "{} value(s) in '{}' coerced to null.",
            invalid.len(),
            column
        ));
        DropMask::new(len)
    }
}

/// Converts every value of a column, nulling the ones that do not fit.
///
/// Fails as a whole when the column holds nested values and the target is not
/// text.
pub fn convert_column(values: &[Value], dtype: DType) -> Result<Vec<Value>, CleanError> {
    if dtype != DType::String {
        if let Some((position, value)) = values.iter().enumerate().find(|(_, v)| v.is_nested()) {
            return Err(CleanError::NestedValue {
                position,
                type_name: value.type_name(),
                dtype,
            });
        }
    }

    Ok(values
        .iter()
        .map(|value| convert_value(value, dtype).unwrap_or(Value::Null))
        .collect())
}

/// Converts one value, or returns `None` when it cannot be represented.
pub fn convert_value(value: &Value, dtype: DType) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    match dtype {
        DType::Int => to_int(value).map(Value::Int),
        DType::Float => to_float(value).map(Value::Float),
        DType::String => Some(match value {
            Value::String(_) => value.clone(),
            other => Value::String(other.to_string()),
        }),
        DType::Bool => to_bool(value).map(Value::Bool),
        DType::DateTime => to_datetime(value).map(Value::Timestamp),
        DType::Category => Some(value.clone()),
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => integral(*f),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18).then_some(f as i64)
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(0) => Some(false),
        Value::Int(1) => Some(true),
        Value::Float(f) if *f == 0.0 => Some(false),
        Value::Float(f) if *f == 1.0 => Some(true),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::String(s) => parse_timestamp(s),
        Value::Int(i) => from_epoch(*i),
        Value::Float(f) => integral(*f).and_then(from_epoch),
        _ => None,
    }
}

/// Parses a timestamp string in multiple formats.
///
/// Supports:
/// - RFC 3339 (e.g., "2024-01-15T10:30:00Z"), converted to UTC
/// - "2024-01-15 10:30:00" and "2024-01-15T10:30:00", with optional fractions
/// - Date only (e.g., "2024-01-15"), at midnight
/// - Unix epoch seconds or milliseconds
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    text.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(epoch: i64) -> Option<NaiveDateTime> {
    // Anything past year 2286 in seconds is taken as milliseconds.
    let dt = if epoch.abs() > 10_000_000_000 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    };
    dt.map(|dt| dt.naive_utc())
}

fn category_domain(values: &[Value]) -> Vec<Value> {
    let mut domain: Vec<Value> = Vec::new();
    for value in values.iter().filter(|v| !v.is_null()) {
        if !domain.iter().any(|seen| seen.loose_eq(value)) {
            domain.push(value.clone());
        }
    }
    domain.sort_by(domain_order);
    domain
}

fn domain_order(a: &Value, b: &Value) -> Ordering {
    a.compare(b)
        .unwrap_or_else(|| a.group_key().cmp(&b.group_key()))
}
